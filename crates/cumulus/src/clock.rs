//! Monotonic wall clock for word and cloud timestamps.
//!
//! Every sample taken from a [`Clock`] is strictly greater than the
//! previous one, even when several mutations land in the same millisecond
//! or the system clock steps backwards.

use std::fmt;

use chrono::{DateTime, Utc};

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Converts to a UTC date-time, `None` if out of chrono's range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }
}

impl fmt::Display for Timestamp {
    /// Formats as `YYYY-MM-DD HH:MM:SS.mmm` in UTC.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S%.3f")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Strictly increasing millisecond clock.
#[derive(Debug)]
pub struct Clock {
    last: Timestamp,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            last: Timestamp::default(),
        }
    }

    /// Samples the clock.
    ///
    /// Returns the current wall time, or one millisecond past the previous
    /// sample if the wall time has not advanced beyond it.
    pub fn tick(&mut self) -> Timestamp {
        self.advance(Self::now_ms())
    }

    fn advance(&mut self, now_ms: u64) -> Timestamp {
        let next = now_ms.max(self.last.0.saturating_add(1));
        self.last = Timestamp(next);
        self.last
    }

    /// Wall time in milliseconds; instants before the epoch read as 0.
    fn now_ms() -> u64 {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_is_strictly_increasing() {
        let mut clock = Clock::new();
        let mut previous = clock.tick();

        for _ in 0..1000 {
            let next = clock.tick();
            assert!(next > previous, "{next:?} should follow {previous:?}");
            previous = next;
        }
    }

    #[test]
    fn test_tick_follows_wall_clock() {
        let before = Utc::now().timestamp_millis() as u64;
        let sample = Clock::new().tick();
        let after = Utc::now().timestamp_millis() as u64;

        assert!(sample.as_millis() >= before);
        assert!(sample.as_millis() <= after);
    }

    #[test]
    fn test_clock_stepping_backwards_still_advances() {
        let mut clock = Clock::new();
        let last = clock.advance(5_000);

        let next = clock.advance(1_000);

        assert_eq!(next, Timestamp::from_millis(last.as_millis() + 1));
        assert_eq!(clock.advance(5_001), Timestamp::from_millis(5_002));
        assert_eq!(clock.advance(9_000), Timestamp::from_millis(9_000));
    }

    #[test]
    fn test_display_format() {
        let timestamp = Timestamp::from_millis(1_431_261_296_789);
        assert_eq!(timestamp.to_string(), "2015-05-10 12:34:56.789");
    }

    #[test]
    fn test_display_out_of_range_falls_back_to_millis() {
        let timestamp = Timestamp::from_millis(u64::MAX);
        assert_eq!(timestamp.to_string(), format!("{}ms", u64::MAX));
    }
}
