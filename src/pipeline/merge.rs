use log::debug;
use polars::prelude::*;

const ROW_INDEX: &str = "__hourly_row";
const MATCHED: &str = "__daily_matched";

/// Result of attaching daily summaries to hourly observations.
#[derive(Debug, Clone)]
pub struct Merged {
    pub frame: DataFrame,
    /// Hourly rows whose date had no daily summary. Their daily fields are null.
    pub unmatched_rows: usize,
}

/// Left-joins `daily` onto `hourly` where `hourly[key] == daily[key]`.
///
/// Every hourly row appears exactly once and in its original order. If
/// `daily` holds more than one row for a date, the first one is used, so the
/// join stays many-to-one. A date without a daily row is not an error; its
/// daily columns are null.
///
/// Output columns are the hourly columns followed by the daily columns other
/// than `key`.
pub fn merge_on_date(hourly: &DataFrame, daily: &DataFrame, key: &str) -> PolarsResult<Merged> {
    let daily_fields: Vec<String> = daily
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .filter(|name| name != key)
        .collect();

    let one_per_date = daily
        .clone()
        .lazy()
        .group_by_stable([col(key)])
        .agg(
            daily_fields
                .iter()
                .map(|name| col(name.as_str()).first())
                .collect::<Vec<_>>(),
        )
        .with_column(lit(true).alias(MATCHED));

    let mut output: Vec<Expr> = hourly
        .get_column_names()
        .iter()
        .map(|name| col(name.as_str()))
        .collect();
    output.extend(daily_fields.iter().map(|name| col(name.as_str())));
    output.push(col(MATCHED));

    let joined = hourly
        .clone()
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .left_join(one_per_date, col(key), col(key))
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .select(output)
        .collect()?;

    let unmatched_rows = joined.column(MATCHED)?.null_count();
    debug!(
        "Merged {} hourly rows; {} have no daily summary",
        joined.height(),
        unmatched_rows
    );

    let frame = joined.drop(MATCHED)?;
    Ok(Merged {
        frame,
        unmatched_rows,
    })
}
