//! Chat notification channel.
//!
//! [`ChatNotifier`] posts block messages and file uploads to a channel.
//! [`SlackNotifier`] implements it over the Slack Web API and
//! [`RecordingNotifier`] keeps every post in memory.

pub mod blocks;
pub mod client;
pub mod error;
pub mod notifier;
pub mod recording;

pub use {
    blocks::{photo_blocks, upload_caption},
    client::{SlackNotifier, SlackOptions},
    error::{Error, Result},
    notifier::ChatNotifier,
    recording::{Notification, RecordingNotifier},
};
