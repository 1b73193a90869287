//! Identifies where a raw table comes from.

use crate::types::frequency::Frequency;
use crate::types::period::Month;
use bon::Builder;
use std::fmt;
use std::path::PathBuf;

const BULK_DATA_URL: &str = "https://climate.weather.gc.ca/climate_data/bulk_data_e.html";

/// A location a raw table can be loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// Any URL returning a headered CSV body.
    Url(String),
    /// A local headered CSV file, or a `.parquet` file.
    Path(PathBuf),
    /// A monthly bulk-data download for one climate station.
    Climate(ClimateSource),
}

impl Source {
    /// The identifier used in diagnostics.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => write!(f, "{url}"),
            Source::Path(path) => write!(f, "{}", path.display()),
            Source::Climate(climate) => write!(f, "{climate}"),
        }
    }
}

impl From<ClimateSource> for Source {
    fn from(value: ClimateSource) -> Self {
        Source::Climate(value)
    }
}

/// One station's bulk CSV for a given month and frequency.
///
/// Daily downloads cover the whole year of `month`; hourly downloads cover
/// the month only.
///
/// ```
/// use outdoor_hours::{ClimateSource, Frequency, Month};
///
/// let source = ClimateSource::builder()
///     .station_id(49568)
///     .month(Month(2025, 1))
///     .frequency(Frequency::Hourly)
///     .build();
///
/// assert!(source.url().contains("stationID=49568"));
/// assert_eq!(source.cache_key(), "hourly-49568-2025-01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Builder)]
pub struct ClimateSource {
    pub station_id: u32,
    pub month: Month,
    pub frequency: Frequency,
}

impl ClimateSource {
    pub fn url(&self) -> String {
        format!(
            "{BULK_DATA_URL}?format=csv&stationID={}&Year={}&Month={}&Day=1&time=LST&timeframe={}&submit=Download+Data",
            self.station_id,
            self.month.year(),
            self.month.month(),
            self.frequency.timeframe()
        )
    }

    /// File stem of the cached response.
    pub fn cache_key(&self) -> String {
        format!("{}-{}-{}", self.frequency, self.station_id, self.month)
    }
}

impl fmt::Display for ClimateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} data for station {} ({})",
            self.frequency, self.station_id, self.month
        )
    }
}
