//! The Load → Select → Merge → Normalize → Classify → Aggregate chain.
//!
//! Each stage takes its input by reference or by value and returns a new
//! table; no stage mutates shared state. [`OutdoorPipeline::run`] is fully
//! synchronous. [`OutdoorPipeline::fetch_and_run`] only adds the two fetches in
//! front of it.

pub mod aggregate;
pub mod classify;
pub mod columns;
pub mod merge;
pub mod normalize;
pub mod select;

use crate::clock::Clock;
use crate::config::{Config, DailyFields, HourlyFields, MissingPolicy, Thresholds};
use crate::error::OutdoorError;
use crate::loader::source::Source;
use crate::loader::FetchRecords;
use crate::types::period::Month;
use aggregate::{pivot_by_date_hour, SuitabilityMatrix};
use chrono::NaiveDate;
use columns::*;
use log::{info, warn};
use polars::prelude::*;
use select::{derive_calendar_date, select_fields, FieldSpec};

/// A raw table together with the identifier it was loaded from.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub source_id: String,
    pub frame: DataFrame,
}

impl RawTable {
    pub fn new(source_id: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            source_id: source_id.into(),
            frame,
        }
    }
}

/// Which hourly observations to classify, already resolved by the caller.
///
/// Observations without a date (their timestamp did not parse) are always
/// kept; they stay in the records but never reach the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Only observations in this month.
    pub month: Option<Month>,
    /// Only observations on or before this date.
    pub until: Option<NaiveDate>,
}

impl Selection {
    /// Every observation.
    pub fn all() -> Self {
        Self::default()
    }

    /// `month`, cut off at the clock's today.
    ///
    /// Bulk downloads for the running month contain empty rows for the hours
    /// that have not happened yet; the cut-off keeps them out of the matrix.
    pub fn month(month: Month, clock: &dyn Clock) -> Self {
        Self {
            month: Some(month),
            until: Some(clock.today()),
        }
    }

    /// The clock's current month up to today.
    pub fn current(clock: &dyn Clock) -> Self {
        Self::month(Month::containing(clock.today()), clock)
    }

    fn predicate(&self) -> Result<Option<Expr>, OutdoorError> {
        let mut predicate: Option<Expr> = None;
        if let Some(month) = self.month {
            let range = month.date_range().ok_or(OutdoorError::InvalidMonth(month))?;
            predicate = Some(
                col(COL_DATE)
                    .gt_eq(lit(range.start))
                    .and(col(COL_DATE).lt_eq(lit(range.end))),
            );
        }
        if let Some(until) = self.until {
            let cutoff = col(COL_DATE).lt_eq(lit(until));
            predicate = Some(match predicate {
                Some(p) => p.and(cutoff),
                None => cutoff,
            });
        }
        Ok(predicate.map(|p| col(COL_DATE).is_null().or(p)))
    }
}

/// The two artifacts handed to a display layer.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Flat merged records, one per hourly observation, with classification.
    pub records: DataFrame,
    pub matrix: SuitabilityMatrix,
    /// Hourly rows that found no daily summary for their date.
    pub unmatched_rows: usize,
}

#[derive(Debug, Clone)]
pub struct OutdoorPipeline {
    thresholds: Thresholds,
    missing_policy: MissingPolicy,
    sentinel: String,
    hourly_fields: HourlyFields,
    daily_fields: DailyFields,
}

impl OutdoorPipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            thresholds: config.thresholds,
            missing_policy: config.missing_policy,
            sentinel: config.sentinel.clone(),
            hourly_fields: config.hourly_fields.clone(),
            daily_fields: config.daily_fields.clone(),
        }
    }

    /// Fetches both sources, then runs the pipeline.
    ///
    /// A fetch failure is returned before any stage runs.
    pub async fn fetch_and_run(
        &self,
        fetcher: &impl FetchRecords,
        hourly: &Source,
        daily: &Source,
        selection: &Selection,
    ) -> Result<PipelineOutput, OutdoorError> {
        let hourly = RawTable::new(hourly.id(), fetcher.fetch(hourly).await?);
        let daily = RawTable::new(daily.id(), fetcher.fetch(daily).await?);
        self.run(&hourly, &daily, selection)
    }

    pub fn run(
        &self,
        hourly: &RawTable,
        daily: &RawTable,
        selection: &Selection,
    ) -> Result<PipelineOutput, OutdoorError> {
        let observations = self.prepare_hourly(hourly, selection)?;
        let summaries = self.prepare_daily(daily)?;
        if observations.height() == 0 {
            warn!("{}: no observations left after selection", hourly.source_id);
        }

        let merged = merge::merge_on_date(&observations, &summaries, COL_DATE)?;
        let normalized = normalize::coerce_numeric(
            &merged.frame,
            &[COL_TEMP, COL_TOTAL_PRECIP, COL_MEAN_TEMP],
            &format!("{} + {}", hourly.source_id, daily.source_id),
        )?;
        let records = classify::classify(normalized, &self.thresholds, self.missing_policy)?;
        let matrix = pivot_by_date_hour(&records)?;

        info!(
            "Classified {} observations over {} days ({} without a daily summary)",
            records.height(),
            matrix.dates().len(),
            merged.unmatched_rows
        );
        Ok(PipelineOutput {
            records,
            matrix,
            unmatched_rows: merged.unmatched_rows,
        })
    }

    /// Selects, renames and date-stamps the hourly table, then applies `selection`.
    fn prepare_hourly(
        &self,
        raw: &RawTable,
        selection: &Selection,
    ) -> Result<DataFrame, OutdoorError> {
        let f = &self.hourly_fields;
        let fields = [
            FieldSpec::timestamp(&f.timestamp, &f.timestamp_format),
            FieldSpec::text(&f.weather),
            FieldSpec::numeric(&f.temperature),
        ];
        let selected = select_fields(&raw.frame, &fields, &self.sentinel, &raw.source_id)?;
        let renamed = selected
            .lazy()
            .select([
                col(f.timestamp.as_str()).alias(COL_TIMESTAMP),
                col(f.weather.as_str()).alias(COL_WEATHER),
                col(f.temperature.as_str()).alias(COL_TEMP),
            ])
            .collect()?;
        let dated = derive_calendar_date(renamed, COL_TIMESTAMP, COL_DATE)?;

        Ok(match selection.predicate()? {
            Some(predicate) => dated.lazy().filter(predicate).collect()?,
            None => dated,
        })
    }

    fn prepare_daily(&self, raw: &RawTable) -> Result<DataFrame, OutdoorError> {
        let f = &self.daily_fields;
        let fields = [
            FieldSpec::date(&f.date, &f.date_format),
            FieldSpec::numeric(&f.total_precip),
            FieldSpec::numeric(&f.mean_temp),
        ];
        let selected = select_fields(&raw.frame, &fields, &self.sentinel, &raw.source_id)?;
        Ok(selected
            .lazy()
            .select([
                col(f.date.as_str()).alias(COL_DATE),
                col(f.total_precip.as_str()).alias(COL_TOTAL_PRECIP),
                col(f.mean_temp.as_str()).alias(COL_MEAN_TEMP),
            ])
            .collect()?)
    }
}
