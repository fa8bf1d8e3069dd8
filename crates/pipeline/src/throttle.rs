//! Long/short reply throttle.

use {
    chrono::{DateTime, Duration, Months, NaiveDateTime, Utc},
    tracing::{debug, warn},
};

/// What the sender row says about the last long reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastLongResponse<'a> {
    /// No sender row exists yet.
    FirstContact,
    /// The sender row exists; the stored value may be missing or malformed.
    Stored(Option<&'a str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleDecision {
    pub long: bool,
    /// Value to persist as the sender's last long response.
    pub last_long_response: DateTime<Utc>,
}

/// Decide whether `received` earns a long reply.
///
/// A long reply is due when more than `threshold_minutes` whole minutes have
/// passed since the stored timestamp. First contact always qualifies. A
/// missing or unparseable timestamp counts as one year before `received`.
#[must_use]
pub fn evaluate(
    last: LastLongResponse<'_>,
    received: DateTime<Utc>,
    threshold_minutes: i64,
) -> ThrottleDecision {
    let previous = match last {
        LastLongResponse::FirstContact => {
            debug!("first contact from sender");
            return ThrottleDecision {
                long: true,
                last_long_response: received,
            };
        },
        LastLongResponse::Stored(raw) => raw.and_then(parse_timestamp).unwrap_or_else(|| {
            warn!(value = ?raw, "unreadable last long response, assuming one year ago");
            one_year_before(received)
        }),
    };

    let elapsed = (received - previous).num_minutes();
    debug!(elapsed_minutes = elapsed, threshold_minutes, "last long response interval");
    if elapsed > threshold_minutes {
        ThrottleDecision {
            long: true,
            last_long_response: received,
        }
    } else {
        ThrottleDecision {
            long: false,
            last_long_response: previous,
        }
    }
}

fn one_year_before(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .checked_sub_months(Months::new(12))
        .unwrap_or(instant - Duration::days(365))
}

/// Parse a stored timestamp: RFC 3339 first, then a bare
/// `YYYY-MM-DD HH:MM:SS` taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone, rstest::rstest};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn first_contact_is_long() {
        let decision = evaluate(LastLongResponse::FirstContact, now(), 60);
        assert!(decision.long);
        assert_eq!(decision.last_long_response, now());
    }

    #[test]
    fn recent_long_reply_keeps_stored_timestamp() {
        let decision = evaluate(
            LastLongResponse::Stored(Some("2024-05-01T11:30:00+00:00")),
            now(),
            60,
        );
        assert!(!decision.long);
        assert_eq!(
            decision.last_long_response,
            Utc.with_ymd_and_hms(2024, 5, 1, 11, 30, 0).unwrap()
        );
    }

    #[test]
    fn old_long_reply_is_renewed() {
        let decision = evaluate(
            LastLongResponse::Stored(Some("2024-05-01T10:30:00.000Z")),
            now(),
            60,
        );
        assert!(decision.long);
        assert_eq!(decision.last_long_response, now());
    }

    #[rstest]
    #[case("2024-05-01T11:00:00Z", false)]
    #[case("2024-05-01T10:59:00Z", true)]
    #[case("2024-05-01T10:59:30Z", false)]
    fn threshold_is_exclusive(#[case] stored: &str, #[case] long: bool) {
        assert_eq!(
            evaluate(LastLongResponse::Stored(Some(stored)), now(), 60).long,
            long
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("yesterday-ish"))]
    fn unreadable_timestamp_counts_as_a_year_ago(#[case] stored: Option<&str>) {
        let decision = evaluate(LastLongResponse::Stored(stored), now(), 60);
        assert!(decision.long);
        assert_eq!(decision.last_long_response, now());
    }

    #[test]
    fn unreadable_timestamp_under_huge_threshold_persists_fallback() {
        let decision = evaluate(LastLongResponse::Stored(Some("garbage")), now(), 10_000_000);
        assert!(!decision.long);
        assert_eq!(
            decision.last_long_response,
            Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn parses_space_separated_utc() {
        assert_eq!(
            parse_timestamp("2024-05-01 11:30:00"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 11, 30, 0).unwrap())
        );
    }
}
