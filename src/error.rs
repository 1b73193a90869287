use crate::loader::error::FetchError;
use polars::prelude::{DataType, PolarsError};
use std::path::PathBuf;
use thiserror::Error;

/// A required field is absent from, or unusable in, a source table.
///
/// This is never recovered locally: a table that lacks a field the
/// classifier depends on must not be classified.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("{source_id}: required field '{field}' not found (available: {})", .available.join(", "))]
    MissingField {
        source_id: String,
        field: String,
        available: Vec<String>,
    },

    #[error("{source_id}: field '{field}' has type {dtype}, which cannot be read as {expected}")]
    UnexpectedType {
        source_id: String,
        field: String,
        dtype: DataType,
        expected: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum OutdoorError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),

    #[error("Month {0} has no valid date range")]
    InvalidMonth(crate::Month),

    #[error("Failed to read config file '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    ConfigParse(PathBuf, #[source] toml::de::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution,
}
