use std::error::Error as StdError;

use phoso_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The Web API answered `ok: false`.
    #[error("slack {method} failed: {error}")]
    Api { method: String, error: String },

    #[error("slack {method} returned HTTP {status}")]
    Http { method: String, status: u16 },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn external<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::External {
            context: context.into(),
            source: Box::new(source),
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
