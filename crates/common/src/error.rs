use std::fmt::Display;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can carry a free-form message.
///
/// Every phoso crate implements this for its own `Error` and then calls
/// [`impl_context!`] so fallible calls can be annotated in place.
pub trait FromMessage: Sized {
    fn from_message(message: String) -> Self;

    /// `"{context}: {cause}"`, the shape every annotated failure takes.
    fn from_cause(context: impl Into<String>, cause: impl Display) -> Self {
        Self::from_message(format!("{}: {cause}", context.into()))
    }
}

/// Declares a `Context` trait in the calling module, implemented for any
/// `Result<T, E: Display>` and for `Option<T>`.
///
/// The caller must have `Error: FromMessage` and a `Result<T>` alias in scope.
///
/// ```ignore
/// phoso_common::impl_context!();
///
/// let row = rows.first().context("sender lookup returned nothing")?;
/// let body = resp.text().await.with_context(|| format!("reading {table}"))?;
/// ```
#[macro_export]
macro_rules! impl_context {
    () => {
        pub trait Context<T> {
            fn context(self, context: impl Into<String>) -> Result<T>;

            fn with_context<C: Into<String>>(self, f: impl FnOnce() -> C) -> Result<T>;
        }

        impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                self.map_err(|cause| <Error as $crate::FromMessage>::from_cause(context, cause))
            }

            fn with_context<C: Into<String>>(self, f: impl FnOnce() -> C) -> Result<T> {
                self.map_err(|cause| <Error as $crate::FromMessage>::from_cause(f(), cause))
            }
        }

        impl<T> Context<T> for Option<T> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                self.ok_or_else(|| <Error as $crate::FromMessage>::from_message(context.into()))
            }

            fn with_context<C: Into<String>>(self, f: impl FnOnce() -> C) -> Result<T> {
                self.ok_or_else(|| <Error as $crate::FromMessage>::from_message(f().into()))
            }
        }
    };
}
