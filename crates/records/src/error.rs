use std::error::Error as StdError;

use phoso_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("record store returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("no row {id} in table {table}")]
    RowNotFound { table: String, id: String },

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

    #[must_use]
    pub fn row_not_found(table: impl Into<String>, id: impl Into<String>) -> Self {
        Self::RowNotFound {
            table: table.into(),
            id: id.into(),
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
