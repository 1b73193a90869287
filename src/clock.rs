//! The source of "today" for relative-date decisions.
//!
//! Nothing in the pipeline reads the system clock directly; callers pass a
//! [`Clock`] so that runs are reproducible in tests.

use chrono::{Local, NaiveDate};

pub trait Clock: Send + Sync {
    /// The current calendar date in the records' local time reference.
    fn today(&self) -> NaiveDate;
}

/// Reads the local system date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date.
///
/// ```
/// use chrono::NaiveDate;
/// use outdoor_hours::{Clock, FixedClock};
///
/// let day = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
/// assert_eq!(FixedClock(day).today(), day);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
