//! Defines the time granularity of the climate records this crate consumes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the time frequency of a climate bulk-data download.
///
/// The two frequencies are the two sides of the merge: many [`Frequency::Hourly`]
/// observations join onto one [`Frequency::Daily`] summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One observation per hour, timestamped in local standard time.
    Hourly,
    /// One summary per calendar day (totals and means).
    Daily,
}

impl Frequency {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
        }
    }

    /// The `timeframe` query parameter understood by the bulk-data endpoint.
    pub(crate) fn timeframe(&self) -> u8 {
        match self {
            Frequency::Hourly => 1,
            Frequency::Daily => 2,
        }
    }
}

/// Allows formatting a `Frequency` variant using its `path_segment`.
///
/// # Examples
///
/// ```
/// use outdoor_hours::Frequency;
///
/// assert_eq!(format!("{}", Frequency::Hourly), "hourly");
/// assert_eq!(Frequency::Daily.to_string(), "daily");
/// ```
impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}
