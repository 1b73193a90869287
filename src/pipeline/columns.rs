//! Column names of the tables the pipeline hands to a display layer.

// Hourly observation
pub const COL_TIMESTAMP: &str = "timestamp";
pub const COL_WEATHER: &str = "weather";
pub const COL_TEMP: &str = "temp_c";

// Shared join key
pub const COL_DATE: &str = "date";

// Daily summary
pub const COL_TOTAL_PRECIP: &str = "total_precip_mm";
pub const COL_MEAN_TEMP: &str = "mean_temp_c";

// Classification
pub const COL_HOUR: &str = "hour";
pub const COL_GOOD: &str = "good_for_outdoor";
pub const COL_GOOD_NUM: &str = "good_for_outdoor_num";
