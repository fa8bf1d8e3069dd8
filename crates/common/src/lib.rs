//! Shared types and error helpers used across all phoso crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    types::{DestinationConfig, InboundEvent, MediaAttachment, Reply},
};
