//! Wall-clock access for the date-dependent formatters.
//!
//! The path builder and the descriptive namer both need "now". They take a
//! `&dyn Clock` so callers (and tests) can pin the date.

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of the current local date and time.
pub trait Clock {
    /// Returns the current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Returns the current local date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Clock backed by the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that always reports the same instant.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use filebutler::clock::{Clock, FixedClock};
///
/// let clock = FixedClock::from_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
/// assert_eq!(clock.today().to_string(), "2024-03-15");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Pins the clock to midnight of the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.and_hms_opt(0, 0, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
