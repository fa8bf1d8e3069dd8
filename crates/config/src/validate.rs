//! Configuration validation.
//!
//! Runs on the fully resolved config (file + env overrides) and reports
//! settings that would make every webhook call fail or behave surprisingly.

use std::collections::HashSet;

use crate::schema::{PhosoConfig, RecordBackend};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "records.api_key"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(severity: Severity, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.severity, self.message)
        } else {
            write!(f, "{}: {}: {}", self.severity, self.path, self.message)
        }
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Validate a resolved config.
#[must_use]
pub fn validate_config(config: &PhosoConfig) -> ValidationResult {
    let mut diagnostics = Vec::new();
    check_records(config, &mut diagnostics);
    check_destinations(config, &mut diagnostics);
    check_collaborators(config, &mut diagnostics);
    check_pipeline(config, &mut diagnostics);
    ValidationResult { diagnostics }
}

fn check_records(config: &PhosoConfig, diagnostics: &mut Vec<Diagnostic>) {
    if config.records.backend == RecordBackend::Memory {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "records.backend",
            "memory backend keeps rows in process only; they are lost on restart",
        ));
        return;
    }
    if config.records.api_key.is_none() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "records.api_key",
            "record store API key is not set (AIRTABLE_API_KEY)",
        ));
    }
    if config.records.base_id.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "records.base_id",
            "record store base id is not set (AIRTABLE_BASE_PHOSO)",
        ));
    }
}

fn check_destinations(config: &PhosoConfig, diagnostics: &mut Vec<Diagnostic>) {
    let destinations = &config.destinations;
    if destinations.entries.is_empty() {
        if config.records.backend == RecordBackend::Memory {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "destinations.entries",
                "no static destinations and the memory record store starts empty; \
                 every call will fail destination lookup",
            ));
        } else if destinations.base_id.is_none() {
            diagnostics.push(Diagnostic::new(
                Severity::Info,
                "destinations.base_id",
                "not set; destination table is read from records.base_id",
            ));
        }
        return;
    }

    let mut seen = HashSet::new();
    for (idx, entry) in destinations.entries.iter().enumerate() {
        let path = format!("destinations.entries[{idx}]");
        if entry.timezone.parse::<chrono_tz::Tz>().is_err() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                format!("{path}.timezone"),
                format!("unknown timezone '{}'", entry.timezone),
            ));
        }
        for (field, value) in [
            ("phone_number", &entry.phone_number),
            ("name", &entry.name),
            ("abbreviation", &entry.abbreviation),
        ] {
            if value.trim().is_empty() {
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    format!("{path}.{field}"),
                    "must not be empty",
                ));
            }
        }
        if !seen.insert(entry.phone_number.as_str()) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                format!("{path}.phone_number"),
                format!(
                    "duplicate phone number '{}'; the first entry wins",
                    entry.phone_number
                ),
            ));
        }
    }
}

fn check_collaborators(config: &PhosoConfig, diagnostics: &mut Vec<Diagnostic>) {
    let drive = &config.drive;
    if drive.enabled {
        for (field, missing) in [
            ("client_id", drive.client_id.is_none()),
            ("client_secret", drive.client_secret.is_none()),
            ("refresh_token", drive.refresh_token.is_none()),
        ] {
            if missing {
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    format!("drive.{field}"),
                    "required while drive uploads are enabled",
                ));
            }
        }
    }

    if config.slack.enabled && config.slack.bot_token.is_none() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "slack.bot_token",
            "required while slack notifications are enabled (SLACK_API_TOKEN)",
        ));
    }
}

fn check_pipeline(config: &PhosoConfig, diagnostics: &mut Vec<Diagnostic>) {
    let threshold = config.pipeline.long_response_threshold_minutes;
    if threshold < 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "pipeline.long_response_threshold_minutes",
            "must not be negative",
        ));
    } else if threshold == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "pipeline.long_response_threshold_minutes",
            "0 sends the long response for nearly every message",
        ));
    }

    let timeout = config.media.fetch_timeout_secs;
    if timeout == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "media.fetch_timeout_secs",
            "must be greater than 0",
        ));
    } else if timeout > 15 {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "media.fetch_timeout_secs",
            "longer than the usual 15s webhook deadline; the transport may give up first",
        ));
    }

    if config.responses.long.trim().is_empty() || config.responses.short.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "responses",
            "an empty response text sends an empty message",
        ));
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::schema::StaticDestination,
        secrecy::Secret,
    };

    fn complete_config() -> PhosoConfig {
        let mut config = PhosoConfig::default();
        config.records.api_key = Some(Secret::new("key".into()));
        config.records.base_id = "appX".into();
        config.destinations.base_id = Some("appY".into());
        config.drive.client_id = Some("id".into());
        config.drive.client_secret = Some(Secret::new("secret".into()));
        config.drive.refresh_token = Some(Secret::new("refresh".into()));
        config.slack.bot_token = Some(Secret::new("xoxb".into()));
        config
    }

    fn destination(phone: &str, tz: &str) -> StaticDestination {
        StaticDestination {
            phone_number: phone.into(),
            name: "Portland".into(),
            abbreviation: "PDX".into(),
            timezone: tz.into(),
            drive_folder: "folder".into(),
            slack_channel: "C1".into(),
        }
    }

    #[test]
    fn complete_config_has_no_errors() {
        let result = validate_config(&complete_config());
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
    }

    #[test]
    fn default_config_reports_missing_credentials() {
        let result = validate_config(&PhosoConfig::default());
        let paths: Vec<&str> = result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.path.as_str())
            .collect();
        assert!(paths.contains(&"records.api_key"));
        assert!(paths.contains(&"records.base_id"));
        assert!(paths.contains(&"drive.refresh_token"));
        assert!(paths.contains(&"slack.bot_token"));
    }

    #[test]
    fn disabled_collaborators_need_no_credentials() {
        let mut config = complete_config();
        config.drive.enabled = false;
        config.drive.client_id = None;
        config.slack.enabled = false;
        config.slack.bot_token = None;
        assert!(!validate_config(&config).has_errors());
    }

    #[test]
    fn flags_bad_static_destinations() {
        let mut config = complete_config();
        config.destinations.entries = vec![
            destination("+15551234567", "America/Los_Angeles"),
            destination("+15551234567", "Not/AZone"),
        ];
        let result = validate_config(&config);
        assert_eq!(result.count(Severity::Error), 1);
        assert_eq!(result.count(Severity::Warning), 1);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "destinations.entries[1].timezone")
        );
    }

    #[test]
    fn flags_pipeline_limits() {
        let mut config = complete_config();
        config.pipeline.long_response_threshold_minutes = -5;
        config.media.fetch_timeout_secs = 0;
        let result = validate_config(&config);
        assert_eq!(result.count(Severity::Error), 2);
    }

    #[test]
    fn diagnostic_display_includes_path() {
        let diag = Diagnostic::new(Severity::Warning, "media.fetch_timeout_secs", "slow");
        assert_eq!(diag.to_string(), "warning: media.fetch_timeout_secs: slow");
    }
}
