use outdoor_hours::{Config, OutdoorError, OutdoorPipeline, RecordLoader, Selection, Source};
use std::io::Write;

const HOURLY_CSV: &str = "\"Date/Time (LST)\",\"Weather\",\"Temp (°C)\"
\"2025-01-01 13:00\",\"Clear\",\"16.0\"
\"2025-01-01 14:00\",\"\",\"20.0\"
\"2025-01-01 15:00\",\"Clear\",\"26.0\"
\"2025-01-02 14:00\",\"Snow\",\"-2.5\"
";

const DAILY_CSV: &str = "\"Date/Time\",\"Total Precip (mm)\",\"Mean Temp (°C)\"
\"2025-01-01\",\"0.0\",\"19.0\"
\"2025-01-02\",\"3.4\",\"-4.0\"
";

fn write_temp(contents: &str) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug to see join and parse diagnostics.
    env_logger::init();

    let hourly = write_temp(HOURLY_CSV)?;
    let daily = write_temp(DAILY_CSV)?;

    let config = Config::default();
    let loader = RecordLoader::from_config(&config.loader)?;
    let output = OutdoorPipeline::new(&config)
        .fetch_and_run(
            &loader,
            &Source::Path(hourly.path().to_path_buf()),
            &Source::Path(daily.path().to_path_buf()),
            &Selection::all(),
        )
        .await
        .map_err(|e: OutdoorError| {
            eprintln!("error: {e}");
            e
        })?;

    println!("{}", output.records);
    println!("{}", output.matrix.to_dataframe()?);
    if let Some((hour, score)) = output.matrix.best_hour() {
        println!("Best hour: {hour:02}:00 (score {score:.2})");
    }
    Ok(())
}
