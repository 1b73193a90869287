use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A calendar month key, `Month(year, month)`.
///
/// This is the "selected month" a caller hands to the pipeline; it is also how
/// bulk downloads are partitioned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Month(pub i32, pub u32);
impl Month {
    pub fn year(self) -> i32 {
        self.0
    }
    pub fn month(self) -> u32 {
        self.1
    }

    /// Returns `None` when `month` is not in `1..=12`.
    pub fn new(month: u32, year: i32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self(year, month))
    }

    /// The month a date falls in.
    pub fn containing(date: NaiveDate) -> Self {
        Self(date.year(), date.month())
    }

    /// First and last day of the month (inclusive).
    pub fn date_range(self) -> Option<StartEndDate> {
        Some(StartEndDate {
            start: NaiveDate::from_ymd_opt(self.0, self.1, 1)?,
            end: NaiveDate::from_ymd_opt(self.0, self.1, days_in_month(self.0, self.1)?)?,
        })
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0, self.1)
    }
}

/// Parses `YYYY-MM`.
///
/// ```
/// use outdoor_hours::Month;
///
/// let m: Month = "2025-01".parse().unwrap();
/// assert_eq!(m, Month(2025, 1));
/// assert!("2025-13".parse::<Month>().is_err());
/// ```
impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{s}'"))?;
        let year: i32 = year
            .trim()
            .parse()
            .map_err(|_| format!("invalid year in '{s}'"))?;
        let month: u32 = month
            .trim()
            .parse()
            .map_err(|_| format!("invalid month in '{s}'"))?;
        Month::new(month, year).ok_or_else(|| format!("month out of range in '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartEndDate {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub(crate) fn days_in_month(year: i32, month: u32) -> Option<u32> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let (next_month_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let first_day_of_next_month = NaiveDate::from_ymd_opt(next_month_year, next_month, 1)?;
    let last_day_of_current_month = first_day_of_next_month - Duration::days(1);
    Some(last_day_of_current_month.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_in_month_handles_leap_years_and_december() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2025, 2), Some(28));
        assert_eq!(days_in_month(2025, 12), Some(31));
        assert_eq!(days_in_month(2025, 0), None);
    }

    #[test]
    fn month_range_covers_whole_month() {
        let range = Month(2025, 4).date_range().unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
    }

    #[test]
    fn month_containing_date() {
        let d = NaiveDate::from_ymd_opt(2025, 9, 17).unwrap();
        assert_eq!(Month::containing(d), Month(2025, 9));
        assert_eq!(Month::containing(d).to_string(), "2025-09");
    }

    #[test]
    fn month_parse_rejects_garbage() {
        assert!("2025".parse::<Month>().is_err());
        assert!("abcd-01".parse::<Month>().is_err());
        assert_eq!(" 2025 - 3 ".trim().parse::<Month>(), Ok(Month(2025, 3)));
    }
}
