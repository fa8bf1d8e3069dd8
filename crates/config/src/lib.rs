//! Configuration loading, env substitution, legacy env overrides and
//! validation.
//!
//! Config files: `phoso.toml`, `phoso.yaml`, or `phoso.json`
//! Searched in `./` then `~/.config/phoso/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file text.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load, load_config},
    schema::{
        DEFAULT_RESPONSE_TEXT, DestinationsConfig, DriveConfig, MediaConfig, MetricsConfig,
        PhosoConfig, PipelineConfig, RecordBackend, RecordsConfig, ResponsesConfig, ServerConfig,
        SlackConfig, SlackPostMode, StaticDestination, TableNames,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate_config},
};
