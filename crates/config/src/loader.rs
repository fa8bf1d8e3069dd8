use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::PhosoConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["phoso.toml", "phoso.yaml", "phoso.yml", "phoso.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<PhosoConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Load the config for a process run.
///
/// An explicit `path` must exist and parse. Without one the standard
/// locations are searched and defaults are used if nothing is found. Legacy
/// environment variables are applied on top in both cases.
pub fn load(path: Option<&Path>) -> anyhow::Result<PhosoConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => discover_and_load(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./phoso.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/phoso/phoso.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PhosoConfig::default()` if no config file is found.
pub fn discover_and_load() -> PhosoConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    PhosoConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/phoso/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "phoso").map(|d| d.config_dir().to_path_buf())
}

/// Apply the environment variables understood by earlier deployments on top
/// of the file config.
pub fn apply_env_overrides(config: &mut PhosoConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut PhosoConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(level) = get("IMAGES_BY_SMS_LOGLEVEL") {
        config.log_level = Some(level.to_lowercase());
    }
    if let Some(text) = get("IMAGES_BY_SMS_LONG_RESPONSE") {
        config.responses.long = text;
    }
    if let Some(text) = get("IMAGES_BY_SMS_SHORT_RESPONSE") {
        config.responses.short = text;
    }
    if let Some(port) = get("IMAGES_BY_SMS_PORT") {
        match port.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(value = %port, "ignoring invalid IMAGES_BY_SMS_PORT"),
        }
    }
    if let Some(key) = get("AIRTABLE_API_KEY") {
        config.records.api_key = Some(Secret::new(key));
    }
    if let Some(base) = get("AIRTABLE_BASE_PHOSO") {
        config.records.base_id = base;
    }
    if let Some(base) = get("AIRTABLE_BASE_IMAGES_BY_SMS") {
        config.destinations.base_id = Some(base);
    }
    if let Some(token) = get("SLACK_API_TOKEN") {
        config.slack.bot_token = Some(Secret::new(token));
    }
    if let Some(id) = get("GOOGLE_DRIVE_CLIENT_ID") {
        config.drive.client_id = Some(id);
    }
    if let Some(secret) = get("GOOGLE_DRIVE_CLIENT_SECRET") {
        config.drive.client_secret = Some(Secret::new(secret));
    }
    if let Some(token) = get("GOOGLE_DRIVE_REFRESH_TOKEN") {
        config.drive.refresh_token = Some(Secret::new(token));
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<PhosoConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret, std::collections::HashMap};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config = PhosoConfig::default();
        apply_env_overrides_with(
            &mut config,
            lookup_from(&[
                ("IMAGES_BY_SMS_LOGLEVEL", "DEBUG"),
                ("IMAGES_BY_SMS_LONG_RESPONSE", "Thanks! We got your photo."),
                ("IMAGES_BY_SMS_PORT", "9090"),
                ("AIRTABLE_API_KEY", "keyABC"),
                ("AIRTABLE_BASE_PHOSO", "appPhoso"),
                ("AIRTABLE_BASE_IMAGES_BY_SMS", "appChapters"),
                ("SLACK_API_TOKEN", "xoxb-1"),
            ]),
        );
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.responses.long, "Thanks! We got your photo.");
        assert_eq!(config.responses.short, crate::DEFAULT_RESPONSE_TEXT);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.records.api_key.unwrap().expose_secret(), "keyABC");
        assert_eq!(config.records.base_id, "appPhoso");
        assert_eq!(config.destinations.base_id.as_deref(), Some("appChapters"));
        assert_eq!(config.slack.bot_token.unwrap().expose_secret(), "xoxb-1");
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let mut config = PhosoConfig::default();
        apply_env_overrides_with(&mut config, lookup_from(&[("IMAGES_BY_SMS_PORT", "eighty")]));
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn blank_override_is_ignored() {
        let mut config = PhosoConfig::default();
        apply_env_overrides_with(
            &mut config,
            lookup_from(&[("IMAGES_BY_SMS_SHORT_RESPONSE", "   ")]),
        );
        assert_eq!(config.responses.short, crate::DEFAULT_RESPONSE_TEXT);
    }

    #[test]
    fn loads_each_supported_format() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("phoso.toml");
        std::fs::write(&toml_path, "[server]\nport = 8123\n").unwrap();
        assert_eq!(load_config(&toml_path).unwrap().server.port, 8123);

        let yaml_path = dir.path().join("phoso.yaml");
        std::fs::write(&yaml_path, "server:\n  port: 8124\n").unwrap();
        assert_eq!(load_config(&yaml_path).unwrap().server.port, 8124);

        let json_path = dir.path().join("phoso.json");
        std::fs::write(&json_path, r#"{"server":{"port":8125}}"#).unwrap();
        assert_eq!(load_config(&json_path).unwrap().server.port, 8125);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phoso.ini");
        std::fs::write(&path, "port=1").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
