/// Config schema types (server, replies, pipeline, media, and the three
/// fan-out collaborators).
use {
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

/// Default acknowledgement text for both reply kinds.
pub const DEFAULT_RESPONSE_TEXT: &str = "Message received!";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhosoConfig {
    /// Log filter used when `RUST_LOG` is unset (e.g. "info", "phoso=debug").
    pub log_level: Option<String>,
    pub server: ServerConfig,
    pub responses: ResponsesConfig,
    pub pipeline: PipelineConfig,
    pub media: MediaConfig,
    pub records: RecordsConfig,
    pub destinations: DestinationsConfig,
    pub drive: DriveConfig,
    pub slack: SlackConfig,
    pub metrics: MetricsConfig,
}

/// Webhook server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "0.0.0.0" since the transport calls in
    /// from the public internet.
    pub bind: String,
    pub port: u16,
    /// Route the inbound transport posts to.
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8000,
            webhook_path: "/images-by-sms".into(),
        }
    }
}

/// Acknowledgement texts returned to the sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponsesConfig {
    pub long: String,
    pub short: String,
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            long: DEFAULT_RESPONSE_TEXT.into(),
            short: DEFAULT_RESPONSE_TEXT.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minutes that must pass after a long reply before another one is sent.
    pub long_response_threshold_minutes: i64,
    /// Append an extension guessed from the content type to filenames.
    pub append_extension: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            long_response_threshold_minutes: 60,
            append_extension: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub fetch_timeout_secs: u64,
    pub max_redirects: usize,
    /// Largest attachment body accepted, in bytes.
    pub max_bytes: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 8,
            max_redirects: 10,
            max_bytes: 20 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordBackend {
    #[default]
    Airtable,
    /// Process-local store; rows are lost on restart. For local runs only.
    Memory,
}

/// Structured record store holding sender, message and photo rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    pub backend: RecordBackend,
    pub api_key: Option<Secret<String>>,
    /// Base holding the Senders / Messages / Photos tables.
    pub base_id: String,
    pub api_url: String,
    pub http_timeout_secs: u64,
    pub tables: TableNames,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            backend: RecordBackend::Airtable,
            api_key: None,
            base_id: String::new(),
            api_url: "https://api.airtable.com/v0".into(),
            http_timeout_secs: 15,
            tables: TableNames::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub senders: String,
    pub messages: String,
    pub photos: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            senders: "Senders".into(),
            messages: "Messages".into(),
            photos: "Photos".into(),
        }
    }
}

/// Where destination ("chapter") settings come from.
///
/// When `entries` is non-empty those static entries are used and the record
/// store table is never queried.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationsConfig {
    /// Base holding the destination table; falls back to `records.base_id`.
    pub base_id: Option<String>,
    pub table: String,
    pub entries: Vec<StaticDestination>,
}

impl Default for DestinationsConfig {
    fn default() -> Self {
        Self {
            base_id: None,
            table: "Chapter Setup".into(),
            entries: Vec::new(),
        }
    }
}

/// A destination declared directly in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticDestination {
    pub phone_number: String,
    pub name: String,
    pub abbreviation: String,
    pub timezone: String,
    pub drive_folder: String,
    pub slack_channel: String,
}

/// Google Drive upload destination.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub enabled: bool,
    pub client_id: Option<String>,
    pub client_secret: Option<Secret<String>>,
    pub refresh_token: Option<Secret<String>>,
    pub token_url: String,
    pub api_url: String,
    pub upload_url: String,
    /// Grant "anyone with the link" read access after upload.
    pub make_public: bool,
    pub http_timeout_secs: u64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            client_id: None,
            client_secret: None,
            refresh_token: None,
            token_url: "https://oauth2.googleapis.com/token".into(),
            api_url: "https://www.googleapis.com/drive/v3".into(),
            upload_url: "https://www.googleapis.com/upload/drive/v3".into(),
            make_public: true,
            http_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlackPostMode {
    /// Upload the photo itself with a caption.
    #[default]
    Upload,
    /// Post blocks that reference the photo by URL.
    Message,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub enabled: bool,
    pub bot_token: Option<Secret<String>>,
    pub api_url: String,
    pub post_mode: SlackPostMode,
    pub http_timeout_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bot_token: None,
            api_url: "https://slack.com/api".into(),
            post_mode: SlackPostMode::Upload,
            http_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}
