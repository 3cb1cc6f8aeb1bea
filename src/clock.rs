//! Time source for submission timestamps.

use time::macros::format_description;
use time::OffsetDateTime;

/// Supplies the instant a write is issued.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Always reports the same instant.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

#[cfg(test)]
impl Clock for FixedClock {
    fn now_utc(&self) -> OffsetDateTime {
        self.0
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2025-02-01T10:00:00.000Z`.
pub fn iso_timestamp(at: OffsetDateTime) -> String {
    let fmt = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    );
    at.to_offset(time::UtcOffset::UTC)
        .format(&fmt)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_with_millis_and_z() {
        let at = datetime!(2025-02-01 10:00:05.123456 UTC);
        assert_eq!(iso_timestamp(at), "2025-02-01T10:00:05.123Z");
    }

    #[test]
    fn converts_offsets_to_utc() {
        let at = datetime!(2025-02-01 15:30:00 +05:30);
        assert_eq!(iso_timestamp(at), "2025-02-01T10:00:00.000Z");
    }

    #[test]
    fn fixed_clock_is_stable() {
        let clock = FixedClock(datetime!(2024-12-31 23:59:59 UTC));
        assert_eq!(clock.now_utc(), clock.now_utc());
    }
}
