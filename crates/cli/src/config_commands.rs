use std::path::Path;

use anyhow::{Result, bail};

use phoso_config::{PhosoConfig, Severity, find_config_file, validate_config};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Print every diagnostic for the resolved config and fail when any is an
/// error.
pub fn check(config: &PhosoConfig, explicit_path: Option<&Path>, verbose: bool) -> Result<()> {
    match explicit_path.map(Path::to_path_buf).or_else(find_config_file) {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults and environment.\n"),
    }

    let result = validate_config(config);
    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        bail!("configuration has {errors} error(s)");
    }
    Ok(())
}

/// Log diagnostics at startup without failing.
pub fn log_diagnostics(config: &PhosoConfig) {
    for d in validate_config(config).diagnostics {
        match d.severity {
            Severity::Error => tracing::error!(path = %d.path, "{}", d.message),
            Severity::Warning => tracing::warn!(path = %d.path, "{}", d.message),
            Severity::Info => tracing::debug!(path = %d.path, "{}", d.message),
        }
    }
}
