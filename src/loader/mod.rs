//! The fetch collaborator: turns a [`Source`] into a raw `DataFrame`.
//!
//! Failures come back as [`FetchError`] values; the pipeline decides whether to
//! stop. Nothing here panics on a network or parse failure.

pub mod data_loader;
pub mod error;
pub mod source;

use crate::loader::error::FetchError;
use crate::loader::source::Source;
use async_trait::async_trait;
use polars::prelude::DataFrame;

/// Produces raw tables with named columns.
///
/// [`data_loader::RecordLoader`] is the HTTP and file implementation. Tests
/// and offline callers can supply their own.
#[async_trait]
pub trait FetchRecords: Send + Sync {
    async fn fetch(&self, source: &Source) -> Result<DataFrame, FetchError>;
}
