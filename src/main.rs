//! `outdoor-hours`: which hours of the month were good for being outside.

use anyhow::Context;
use clap::Parser;
use log::info;
use outdoor_hours::{
    ClimateSource, Clock, Config, Frequency, Month, OutdoorPipeline, RecordLoader, Selection,
    Source, SystemClock,
};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "outdoor-hours",
    version,
    about = "Hour-of-day outdoor suitability from climate station data"
)]
struct Cli {
    /// TOML configuration file; defaults apply when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Month to report, as YYYY-MM. Defaults to the current month.
    #[arg(long)]
    month: Option<Month>,

    /// Overrides the configured hourly station id.
    #[arg(long)]
    hourly_station: Option<u32>,

    /// Overrides the configured daily station id.
    #[arg(long)]
    daily_station: Option<u32>,

    /// Reads hourly observations from a local CSV or parquet file instead of downloading.
    #[arg(long)]
    hourly_file: Option<PathBuf>,

    /// Reads daily summaries from a local CSV or parquet file instead of downloading.
    #[arg(long)]
    daily_file: Option<PathBuf>,

    /// Disables the response cache.
    #[arg(long)]
    no_cache: bool,

    /// Writes the classified records as CSV.
    #[arg(long)]
    records_out: Option<PathBuf>,

    /// Writes the date × hour matrix as CSV.
    #[arg(long)]
    matrix_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = Cli::parse().run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

impl Cli {
    async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load(self.config.as_deref())?;
        if self.no_cache {
            config.loader.cache_enabled = false;
        }

        let clock = SystemClock;
        let month = self.month.unwrap_or_else(|| Month::containing(clock.today()));
        let selection = Selection::month(month, &clock);

        let hourly = source_for(
            self.hourly_file,
            self.hourly_station.unwrap_or(config.stations.hourly),
            month,
            Frequency::Hourly,
        );
        let daily = source_for(
            self.daily_file,
            self.daily_station.unwrap_or(config.stations.daily),
            month,
            Frequency::Daily,
        );
        info!("Hourly source: {hourly}");
        info!("Daily source: {daily}");

        let loader = RecordLoader::from_config(&config.loader)?;
        let output = OutdoorPipeline::new(&config)
            .fetch_and_run(&loader, &hourly, &daily, &selection)
            .await?;

        if let Some(path) = &self.records_out {
            let mut records = output.records.clone();
            write_csv(&mut records, path)?;
            info!("Wrote {} records to {}", records.height(), path.display());
        }

        if output.matrix.is_empty() {
            println!("No classified observations for {month}: the matrix is empty.");
            return Ok(());
        }

        let mut matrix = output.matrix.to_dataframe()?;
        if let Some(path) = &self.matrix_out {
            write_csv(&mut matrix, path)?;
            info!("Wrote matrix to {}", path.display());
        }

        println!("{matrix}");
        let best = match output.matrix.best_hour() {
            Some((hour, score)) => format!("{hour:02}:00 ({:.0}% of days)", score * 100.0),
            None => "none".to_string(),
        };
        println!(
            "{} observations, {} days, {} without a daily summary, best hour: {}",
            output.records.height(),
            output.matrix.dates().len(),
            output.unmatched_rows,
            best
        );
        Ok(())
    }
}

fn source_for(
    file: Option<PathBuf>,
    station_id: u32,
    month: Month,
    frequency: Frequency,
) -> Source {
    match file {
        Some(path) => Source::Path(path),
        None => ClimateSource::builder()
            .station_id(station_id)
            .month(month)
            .frequency(frequency)
            .build()
            .into(),
    }
}

fn write_csv(df: &mut DataFrame, path: &Path) -> anyhow::Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("{}: cannot create file", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("{}: failed to write CSV", path.display()))?;
    Ok(())
}
