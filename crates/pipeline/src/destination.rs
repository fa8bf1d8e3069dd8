//! Destination lookup by recipient address.

use std::sync::Arc;

use {
    async_trait::async_trait,
    phoso_common::DestinationConfig,
    phoso_config::StaticDestination,
    phoso_records::{RecordStore, Row},
    tracing::debug,
};

use crate::{Error, Result, fields::destination as field};

/// Source of per-destination settings.
#[async_trait]
pub trait DestinationSource: Send + Sync {
    /// The destination whose phone number equals `recipient`.
    ///
    /// Fails with [`Error::DestinationNotConfigured`] when there is none.
    async fn resolve(&self, recipient: &str) -> Result<DestinationConfig>;
}

/// Destinations kept as rows of a record store table.
pub struct RecordDestinations {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl RecordDestinations {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }
}

fn required<'a>(row: &'a Row, recipient: &str, name: &str) -> Result<&'a str> {
    row.str_field(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::invalid_destination(recipient, format!("missing field '{name}'")))
}

fn destination_from_row(row: &Row, recipient: &str) -> Result<DestinationConfig> {
    DestinationConfig::from_parts(
        recipient,
        required(row, recipient, field::NAME)?,
        required(row, recipient, field::ABBREVIATION)?,
        required(row, recipient, field::TIMEZONE)?,
        required(row, recipient, field::DRIVE_FOLDER)?,
        required(row, recipient, field::SLACK_CHANNEL)?,
    )
    .map_err(|e| Error::invalid_destination(recipient, e.to_string()))
}

#[async_trait]
impl DestinationSource for RecordDestinations {
    async fn resolve(&self, recipient: &str) -> Result<DestinationConfig> {
        let row = self
            .store
            .find(&self.table, field::PHONE_NUMBER, recipient)
            .await?
            .ok_or_else(|| Error::DestinationNotConfigured {
                recipient: recipient.to_string(),
            })?;
        debug!(recipient, row = %row.id, "destination row found");
        destination_from_row(&row, recipient)
    }
}

/// Destinations declared in the config file.
#[derive(Debug, Clone, Default)]
pub struct StaticDestinations {
    entries: Vec<DestinationConfig>,
}

impl StaticDestinations {
    #[must_use]
    pub fn new(entries: Vec<DestinationConfig>) -> Self {
        Self { entries }
    }

    /// Build from config entries, rejecting unknown timezones up front.
    pub fn from_config(entries: &[StaticDestination]) -> Result<Self> {
        let entries = entries
            .iter()
            .map(|entry| {
                DestinationConfig::from_parts(
                    entry.phone_number.trim(),
                    &entry.name,
                    &entry.abbreviation,
                    &entry.timezone,
                    &entry.drive_folder,
                    &entry.slack_channel,
                )
                .map_err(|e| Error::invalid_destination(&entry.phone_number, e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl DestinationSource for StaticDestinations {
    async fn resolve(&self, recipient: &str) -> Result<DestinationConfig> {
        self.entries
            .iter()
            .find(|entry| entry.phone_number == recipient)
            .cloned()
            .ok_or_else(|| Error::DestinationNotConfigured {
                recipient: recipient.to_string(),
            })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        phoso_records::{Fields, MemoryRecordStore},
        serde_json::json,
    };

    fn chapter_row(timezone: &str) -> Fields {
        [
            (field::PHONE_NUMBER, json!("+15551234567")),
            (field::NAME, json!("Portland")),
            (field::ABBREVIATION, json!("PDX")),
            (field::TIMEZONE, json!(timezone)),
            (field::DRIVE_FOLDER, json!("folder-1")),
            (field::SLACK_CHANNEL, json!("C0123")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    async fn source_with(row: Fields) -> RecordDestinations {
        let store = Arc::new(MemoryRecordStore::new());
        store.insert("Chapter Setup", row).await.unwrap();
        RecordDestinations::new(store, "Chapter Setup")
    }

    #[tokio::test]
    async fn resolves_record_row() {
        let source = source_with(chapter_row("America/Los_Angeles")).await;
        let dest = source.resolve("+15551234567").await.unwrap();
        assert_eq!(dest.name, "Portland");
        assert_eq!(dest.abbreviation, "PDX");
        assert_eq!(dest.timezone, chrono_tz::America::Los_Angeles);
        assert_eq!(dest.slack_channel, "C0123");
    }

    #[tokio::test]
    async fn unknown_recipient_is_not_configured() {
        let source = source_with(chapter_row("America/Los_Angeles")).await;
        let err = source.resolve("+15550000000").await.unwrap_err();
        assert!(matches!(err, Error::DestinationNotConfigured { ref recipient } if recipient == "+15550000000"));
    }

    #[tokio::test]
    async fn bad_timezone_is_invalid() {
        let source = source_with(chapter_row("Pacific/Atlantis")).await;
        let err = source.resolve("+15551234567").await.unwrap_err();
        assert!(matches!(err, Error::InvalidDestination { .. }));
    }

    #[tokio::test]
    async fn missing_field_is_invalid() {
        let mut row = chapter_row("America/Los_Angeles");
        row.remove(field::SLACK_CHANNEL);
        let source = source_with(row).await;
        let err = source.resolve("+15551234567").await.unwrap_err();
        assert!(err.to_string().contains("Slack Channel"), "{err}");
    }

    #[tokio::test]
    async fn static_destinations_match_exactly() {
        let source = StaticDestinations::from_config(&[StaticDestination {
            phone_number: "+15551234567".into(),
            name: "Portland".into(),
            abbreviation: "PDX".into(),
            timezone: "America/Los_Angeles".into(),
            drive_folder: "folder-1".into(),
            slack_channel: "C0123".into(),
        }])
        .unwrap();
        assert!(source.resolve("+15551234567").await.is_ok());
        assert!(matches!(
            source.resolve("15551234567").await.unwrap_err(),
            Error::DestinationNotConfigured { .. }
        ));
    }

    #[test]
    fn static_destinations_reject_unknown_timezone() {
        let err = StaticDestinations::from_config(&[StaticDestination {
            phone_number: "+1".into(),
            name: "X".into(),
            abbreviation: "X".into(),
            timezone: "Nowhere/Special".into(),
            drive_folder: "f".into(),
            slack_channel: "c".into(),
        }])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDestination { .. }));
    }
}
