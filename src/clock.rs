//! Clock collaborator.
//!
//! Supplies "today" for default mass dates, series start dates and the current
//! quota month, and the timestamp stamped on appended masses. Tests pin both with
//! [`FixedClock`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Source of the current calendar date and instant.
pub trait Clock: Send + Sync {
    /// The current date.
    fn today(&self) -> NaiveDate;

    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock, using the UTC date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that always reports the same date; its instant is midnight UTC of that date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }

    fn now(&self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::MIN).and_utc()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let clock = FixedClock(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.now().date_naive(), date);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_system_clock_matches_utc_date() {
        let before = Utc::now().date_naive();
        let today = SystemClock.today();
        let after = Utc::now().date_naive();
        assert!(today >= before && today <= after);
    }
}
