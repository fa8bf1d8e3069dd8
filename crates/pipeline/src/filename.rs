//! Artifact filename assembly.

use {
    chrono::{DateTime, Utc},
    phoso_common::DestinationConfig,
    phoso_media::extension_for,
    rand::Rng,
};

/// `{YYYY-MM-DD}_{sender}_{HHMM}_{NN}_{abbr}[.ext]` in the destination's
/// local time, with `NN` two random digits.
///
/// The extension comes from `content_type` and is omitted when it is `None`
/// or unknown.
#[must_use]
pub fn assemble_filename(
    received: DateTime<Utc>,
    sender_id: &str,
    destination: &DestinationConfig,
    content_type: Option<&str>,
) -> String {
    let digits = rand::rng().random_range(0..100);
    assemble_filename_with_digits(received, sender_id, destination, content_type, digits)
}

/// [`assemble_filename`] with the random digits supplied by the caller.
#[must_use]
pub fn assemble_filename_with_digits(
    received: DateTime<Utc>,
    sender_id: &str,
    destination: &DestinationConfig,
    content_type: Option<&str>,
    digits: u8,
) -> String {
    let local = received.with_timezone(&destination.timezone);
    let extension = content_type.and_then(extension_for).unwrap_or_default();
    format!(
        "{}_{}_{}_{:02}_{}{}",
        local.format("%Y-%m-%d"),
        sender_id,
        local.format("%H%M"),
        digits % 100,
        destination.abbreviation,
        extension
    )
}
