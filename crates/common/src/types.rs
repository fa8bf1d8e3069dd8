//! Domain types shared by the intake pipeline, the gateway and the clients.

use {
    chrono_tz::Tz,
    serde::{Deserialize, Serialize},
};

use crate::{Error, Result};

/// One media item attached to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub url: String,
    pub content_type: String,
}

impl MediaAttachment {
    pub fn new(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: content_type.into(),
        }
    }
}

/// A parsed inbound MMS/SMS webhook call.
///
/// Built once by the transport layer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Transport message id (e.g. Twilio `SmsMessageSid`), logging only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Address the message was sent to (the destination number).
    pub recipient: String,
    /// Address the message came from. Never persisted in the clear.
    pub sender: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<MediaAttachment>,
}

impl InboundEvent {
    pub fn new(recipient: impl Into<String>, sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: None,
            recipient: recipient.into(),
            sender: sender.into(),
            body: body.into(),
            attachments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: MediaAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Per-destination ("chapter") settings, keyed by the recipient address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationConfig {
    pub phone_number: String,
    /// Human readable name, stored on every message record.
    pub name: String,
    /// Short code used as the filename suffix.
    pub abbreviation: String,
    pub timezone: Tz,
    /// Cloud storage folder id that receives uploads.
    pub drive_folder: String,
    /// Chat channel that receives notifications.
    pub slack_channel: String,
}

impl DestinationConfig {
    /// Build a destination, parsing `timezone` as an IANA zone name.
    pub fn from_parts(
        phone_number: impl Into<String>,
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        timezone: &str,
        drive_folder: impl Into<String>,
        slack_channel: impl Into<String>,
    ) -> Result<Self> {
        let timezone = timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| Error::UnknownTimezone(timezone.to_string()))?;
        Ok(Self {
            phone_number: phone_number.into(),
            name: name.into(),
            abbreviation: abbreviation.into(),
            timezone,
            drive_folder: drive_folder.into(),
            slack_channel: slack_channel.into(),
        })
    }
}

/// The acknowledgement sent back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Long(String),
    Short(String),
    /// Well-formed reply with no message, used when processing failed.
    Empty,
}

impl Reply {
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Long(text) | Self::Short(text) => Some(text),
            Self::Empty => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Long(_) => "long",
            Self::Short(_) => "short",
            Self::Empty => "empty",
        }
    }
}
