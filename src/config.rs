//! Run configuration, read from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) configures
//! the Ottawa stations with the 15–25 °C / dry classifier.

use crate::error::OutdoorError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CACHE_DIR_NAME: &str = "outdoor_hours_cache";

/// Inclusive bounds of the good-for-outdoor predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub temp_min: f64,
    pub temp_max: f64,
    pub max_precip: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temp_min: 15.0,
            temp_max: 25.0,
            max_precip: 0.0,
        }
    }
}

/// What the classifier does with a row whose temperature or precipitation is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Treat missing inputs as `0` when classifying. A missing reading then
    /// scores as "not suitable" for temperature and "dry" for precipitation.
    #[default]
    ScoreAsZero,
    /// Leave the classification null so the row drops out of the matrix mean.
    Exclude,
}

/// Column names of the hourly source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourlyFields {
    pub timestamp: String,
    pub timestamp_format: String,
    pub weather: String,
    pub temperature: String,
}

impl Default for HourlyFields {
    fn default() -> Self {
        Self {
            timestamp: "Date/Time (LST)".to_string(),
            timestamp_format: "%Y-%m-%d %H:%M".to_string(),
            weather: "Weather".to_string(),
            temperature: "Temp (°C)".to_string(),
        }
    }
}

/// Column names of the daily source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyFields {
    pub date: String,
    pub date_format: String,
    pub total_precip: String,
    pub mean_temp: String,
}

impl Default for DailyFields {
    fn default() -> Self {
        Self {
            date: "Date/Time".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            total_precip: "Total Precip (mm)".to_string(),
            mean_temp: "Mean Temp (°C)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// `None` resolves to the platform cache directory.
    pub cache_dir: Option<PathBuf>,
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub retries: u32,
    pub retry_backoff_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            cache_enabled: true,
            cache_ttl_secs: 3600,
            retries: 3,
            retry_backoff_ms: 500,
            timeout_secs: 30,
            user_agent: concat!("outdoor_hours/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl LoaderConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured cache directory, or `<platform cache dir>/outdoor_hours_cache`.
    pub fn resolve_cache_dir(&self) -> Result<PathBuf, OutdoorError> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::cache_dir()
                .map(|p| p.join(CACHE_DIR_NAME))
                .ok_or(OutdoorError::CacheDirResolution),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stations {
    pub hourly: u32,
    pub daily: u32,
}

impl Default for Stations {
    fn default() -> Self {
        Self {
            hourly: 49568,
            daily: 30578,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub thresholds: Thresholds,
    /// Fills absent text cells (the weather description).
    pub sentinel: String,
    pub missing_policy: MissingPolicy,
    pub hourly_fields: HourlyFields,
    pub daily_fields: DailyFields,
    pub loader: LoaderConfig,
    pub stations: Stations,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            sentinel: "N/A".to_string(),
            missing_policy: MissingPolicy::default(),
            hourly_fields: HourlyFields::default(),
            daily_fields: DailyFields::default(),
            loader: LoaderConfig::default(),
            stations: Stations::default(),
        }
    }
}

impl Config {
    /// Loads `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, OutdoorError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .map_err(|e| OutdoorError::ConfigRead(path.to_path_buf(), e))?;
        Self::from_toml(&contents).map_err(|e| OutdoorError::ConfigParse(path.to_path_buf(), e))
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.thresholds.temp_min, 15.0);
        assert_eq!(cfg.thresholds.temp_max, 25.0);
        assert_eq!(cfg.thresholds.max_precip, 0.0);
        assert_eq!(cfg.missing_policy, MissingPolicy::ScoreAsZero);
        assert_eq!(cfg.hourly_fields.temperature, "Temp (°C)");
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let cfg = Config::from_toml(
            r#"
            missing_policy = "exclude"

            [thresholds]
            temp_max = 28.0

            [loader]
            retries = 5
            cache_dir = "/tmp/oh"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.missing_policy, MissingPolicy::Exclude);
        assert_eq!(cfg.thresholds.temp_min, 15.0);
        assert_eq!(cfg.thresholds.temp_max, 28.0);
        assert_eq!(cfg.loader.retries, 5);
        assert_eq!(cfg.loader.timeout_secs, 30);
        assert_eq!(
            cfg.loader.resolve_cache_dir().unwrap(),
            PathBuf::from("/tmp/oh")
        );
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(Config::from_toml("missing_policy = \"guess\"").is_err());
    }

    #[test]
    fn load_reports_the_path_on_parse_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "thresholds = 3").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, OutdoorError::ConfigParse(ref p, _) if p == file.path()));
    }

    #[test]
    fn load_without_path_is_default() {
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }
}
