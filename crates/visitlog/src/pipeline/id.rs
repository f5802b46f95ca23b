use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

const SUFFIX_MODULUS: u64 = 1_000_000_000;

/// Issues submission ids of the form `<prefix><9 digits>`, the digits being
/// the tail of the wall clock in microseconds.
///
/// Ids never repeat within a process: when the clock has not advanced past
/// the last issued instant, the instant is bumped by one microsecond.
pub struct SubmissionIdGenerator {
    prefix: String,
    last_micros: AtomicU64,
}

impl SubmissionIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last_micros: AtomicU64::new(0),
        }
    }

    pub fn next(&self) -> String {
        self.next_at(Utc::now())
    }

    pub fn next_at(&self, now: DateTime<Utc>) -> String {
        let candidate = u64::try_from(now.timestamp_micros()).unwrap_or(0);
        let advance = |last: u64| candidate.max(last + 1);

        let issued = match self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(advance(last)))
        {
            Ok(previous) | Err(previous) => advance(previous),
        };

        format!("{}{:09}", self.prefix, issued % SUFFIX_MODULUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format() {
        let ids = SubmissionIdGenerator::new("K25LVT");
        let at = Utc.timestamp_micros(1_751_000_123_456_789).unwrap();
        assert_eq!(ids.next_at(at), "K25LVT123456789");
    }

    #[test]
    fn test_short_suffix_is_zero_padded() {
        let ids = SubmissionIdGenerator::new("V");
        let at = Utc.timestamp_micros(5_000_000_000_000_042).unwrap();
        assert_eq!(ids.next_at(at), "V000000042");
    }

    #[test]
    fn test_same_instant_is_bumped() {
        let ids = SubmissionIdGenerator::new("K25LVT");
        let at = Utc.timestamp_micros(1_751_000_123_456_789).unwrap();
        let first = ids.next_at(at);
        let second = ids.next_at(at);
        let third = ids.next_at(at - chrono::Duration::seconds(1));
        assert_eq!(first, "K25LVT123456789");
        assert_eq!(second, "K25LVT123456790");
        assert_eq!(third, "K25LVT123456791");
    }

    #[test]
    fn test_wall_clock_ids_differ() {
        let ids = SubmissionIdGenerator::new("K25LVT");
        let a = ids.next();
        let b = ids.next();
        assert_ne!(a, b);
        assert_eq!(a.len(), "K25LVT".len() + 9);
    }
}
