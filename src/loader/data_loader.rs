use crate::config::LoaderConfig;
use crate::error::OutdoorError;
use crate::loader::error::FetchError;
use crate::loader::source::{ClimateSource, Source};
use crate::loader::FetchRecords;
use async_trait::async_trait;
use bon::bon;
use log::{debug, info, warn};
use polars::prelude::*;
use reqwest::Client;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::{fs, task};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Loads raw tables over HTTP or from disk.
///
/// The HTTP client and the response cache belong to the loader instance; two
/// loaders never share state. Climate-station downloads are cached as parquet
/// files keyed by station, frequency and month.
#[derive(Debug)]
pub struct RecordLoader {
    client: Client,
    cache_dir: Option<PathBuf>,
    cache_ttl: Duration,
    retries: u32,
    retry_backoff: Duration,
}

#[bon]
impl RecordLoader {
    /// Creates a loader around an already configured `reqwest::Client`.
    ///
    /// Leaving `cache_dir` unset disables the response cache.
    #[builder]
    pub fn new(
        client: Client,
        cache_dir: Option<PathBuf>,
        #[builder(default = Duration::from_secs(3600))] cache_ttl: Duration,
        #[builder(default = 3)] retries: u32,
        #[builder(default = Duration::from_millis(500))] retry_backoff: Duration,
    ) -> Self {
        Self {
            client,
            cache_dir,
            cache_ttl,
            retries,
            retry_backoff,
        }
    }

    /// Builds the HTTP client and loader described by `config`.
    pub fn from_config(config: &LoaderConfig) -> Result<Self, OutdoorError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FetchError::ClientBuild)?;
        let cache_dir = if config.cache_enabled {
            Some(config.resolve_cache_dir()?)
        } else {
            None
        };
        Ok(Self::builder()
            .client(client)
            .maybe_cache_dir(cache_dir)
            .cache_ttl(config.cache_ttl())
            .retries(config.retries)
            .retry_backoff(config.retry_backoff())
            .build())
    }
}

impl RecordLoader {
    async fn load_path(&self, path: &Path) -> Result<DataFrame, FetchError> {
        if path.extension().is_some_and(|ext| ext == "parquet") {
            return read_parquet(path.to_path_buf()).await;
        }
        let bytes = fs::read(path)
            .await
            .map_err(|e| FetchError::FileRead(path.to_path_buf(), e))?;
        csv_to_dataframe(bytes, path.display().to_string()).await
    }

    async fn load_url(&self, url: &str) -> Result<DataFrame, FetchError> {
        let bytes = self.download(url).await?;
        csv_to_dataframe(bytes, url.to_string()).await
    }

    async fn load_climate(&self, source: &ClimateSource) -> Result<DataFrame, FetchError> {
        let Some(cache_dir) = &self.cache_dir else {
            return self.load_url(&source.url()).await;
        };
        let parquet_path = cache_dir.join(format!("{}.parquet", source.cache_key()));

        if is_fresh(&parquet_path, self.cache_ttl).await? {
            info!("Cache hit for {} at {:?}", source, parquet_path);
            return read_parquet(parquet_path).await;
        }

        warn!("Cache miss for {}. Downloading.", source);
        let df = self.load_url(&source.url()).await?;

        // Cache write failures are not fatal.
        if let Err(e) = write_cache(df.clone(), cache_dir, &parquet_path).await {
            warn!("Could not cache {}: {}", source, e);
        } else {
            info!("Cached {} to {:?}", source, parquet_path);
        }
        Ok(df)
    }

    /// Downloads `url`, retrying transient failures with linear backoff.
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let max_attempts = self.retries + 1;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.download_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.retry_backoff * attempt;
                    warn!(
                        "Attempt {}/{} for {} failed ({}); retrying in {:?}",
                        attempt, max_attempts, url, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if attempt > 1 => {
                    return Err(FetchError::RetriesExhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        last: Box::new(e),
                    })
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn download_once(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        info!("Downloading data from {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyResponse(url.to_string()));
        }
        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl FetchRecords for RecordLoader {
    async fn fetch(&self, source: &Source) -> Result<DataFrame, FetchError> {
        match source {
            Source::Url(url) => self.load_url(url).await,
            Source::Path(path) => self.load_path(path).await,
            Source::Climate(climate) => self.load_climate(climate).await,
        }
    }
}

/// Parses a headered CSV body into a DataFrame on a blocking thread.
async fn csv_to_dataframe(mut bytes: Vec<u8>, source_id: String) -> Result<DataFrame, FetchError> {
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    task::spawn_blocking(move || {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10_000))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|e| FetchError::CsvRead {
                source_id: source_id.clone(),
                source: e,
            })?;
        debug!(
            "Parsed {} rows x {} columns from {}",
            df.height(),
            df.width(),
            source_id
        );
        Ok(df)
    })
    .await?
}

async fn read_parquet(path: PathBuf) -> Result<DataFrame, FetchError> {
    task::spawn_blocking(move || {
        let file = std::fs::File::open(&path).map_err(|e| FetchError::FileRead(path.clone(), e))?;
        ParquetReader::new(file)
            .finish()
            .map_err(|e| FetchError::ParquetRead(path, e))
    })
    .await?
}

/// A cache entry is fresh when it exists and was written less than `ttl` ago.
async fn is_fresh(path: &Path, ttl: Duration) -> Result<bool, FetchError> {
    let metadata = match fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(FetchError::CacheMetadataRead(path.to_path_buf(), e)),
    };
    let modified = metadata
        .modified()
        .map_err(|e| FetchError::CacheMetadataRead(path.to_path_buf(), e))?;
    // A timestamp in the future means the clock moved; keep the entry.
    Ok(modified.elapsed().map_or(true, |age| age <= ttl))
}

/// Writes `df` next to `path` and renames it into place.
async fn write_cache(mut df: DataFrame, cache_dir: &Path, path: &Path) -> Result<(), FetchError> {
    fs::create_dir_all(cache_dir)
        .await
        .map_err(|e| FetchError::CacheDirCreation(cache_dir.to_path_buf(), e))?;
    let cache_dir = cache_dir.to_path_buf();
    let path = path.to_path_buf();
    task::spawn_blocking(move || {
        let mut temp = NamedTempFile::new_in(&cache_dir)
            .map_err(|e| FetchError::ParquetWriteIo(path.clone(), e))?;
        ParquetWriter::new(temp.as_file_mut())
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)
            .map_err(|e| FetchError::ParquetWritePolars(path.clone(), e))?;
        temp.persist(&path)
            .map_err(|e| FetchError::ParquetWriteIo(path.clone(), e.error))?;
        Ok::<(), FetchError>(())
    })
    .await??;
    Ok(())
}
