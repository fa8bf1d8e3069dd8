use phoso_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no destination configured for {recipient}")]
    DestinationNotConfigured { recipient: String },

    #[error("destination {recipient} is invalid: {reason}")]
    InvalidDestination { recipient: String, reason: String },

    #[error(transparent)]
    Records(#[from] phoso_records::Error),

    #[error(transparent)]
    Media(#[from] phoso_media::Error),

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn invalid_destination(recipient: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDestination {
            recipient: recipient.into(),
            reason: reason.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

phoso_common::impl_context!();
