use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a raw table for a source.
///
/// Every variant carries the source identifier so a caller can report which
/// download or file failed, not just why.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Giving up on {url} after {attempts} attempts")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Failed to read '{0}'")]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse CSV data from {source_id}")]
    CsvRead {
        source_id: String,
        #[source]
        source: PolarsError,
    },

    #[error("Response from {0} contained no rows")]
    EmptyResponse(String),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read metadata for cache file '{0}'")]
    CacheMetadataRead(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing parquet cache file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing parquet cache file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to read parquet file '{0}'")]
    ParquetRead(PathBuf, #[source] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl FetchError {
    /// Whether another attempt at the same request could succeed.
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            FetchError::NetworkRequest(_, _) | FetchError::EmptyResponse(_) => true,
            FetchError::HttpStatus { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
