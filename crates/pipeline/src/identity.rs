//! Sender identity derivation.

use {
    base64::{Engine, engine::general_purpose::STANDARD},
    hmac::{Hmac, Mac},
    sha2::Sha256,
};

type HmacSha256 = Hmac<Sha256>;

/// Length of a sender identifier.
pub const SENDER_ID_LEN: usize = 8;

/// Stable alphabetic identifier for the `sender` texting `recipient`.
///
/// HMAC-SHA256 keyed by the recipient over the sender, base64 encoded,
/// uppercased, reduced to `A-Z` and cut to [`SENDER_ID_LEN`] characters.
/// Raw addresses never leave this function.
#[must_use]
pub fn sender_id(recipient: &str, sender: &str) -> String {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(recipient.as_bytes())
        .unwrap_or_else(|_| HmacSha256::new(&Default::default()));
    mac.update(sender.as_bytes());
    let encoded = STANDARD.encode(mac.finalize().into_bytes());

    encoded
        .to_ascii_uppercase()
        .chars()
        .filter(char::is_ascii_uppercase)
        .take(SENDER_ID_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("+15551234567", "+15559876543", "BXCGXVMZ")]
    #[case("+15559876543", "+15551234567", "ZMPZHBVI")]
    #[case("", "", "THNNMGGU")]
    fn known_identifiers(#[case] recipient: &str, #[case] sender: &str, #[case] expected: &str) {
        assert_eq!(sender_id(recipient, sender), expected);
    }

    #[test]
    fn deterministic_and_alphabetic() {
        for (recipient, sender) in [
            ("+15551234567", "+15559876543"),
            ("+442071838750", "+447700900123"),
            ("whatsapp:+15551234567", "whatsapp:+15550000000"),
        ] {
            let id = sender_id(recipient, sender);
            assert_eq!(id, sender_id(recipient, sender));
            assert_eq!(id.len(), SENDER_ID_LEN);
            assert!(id.chars().all(|c| c.is_ascii_uppercase()), "{id}");
        }
    }

    #[test]
    fn depends_on_both_addresses() {
        let base = sender_id("+15551234567", "+15559876543");
        assert_ne!(base, sender_id("+15551234567", "+15559876544"));
        assert_ne!(base, sender_id("+15551234568", "+15559876543"));
    }
}
