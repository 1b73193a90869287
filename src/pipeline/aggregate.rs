//! The date × hour pivot handed to display code.

use crate::pipeline::columns::{COL_DATE, COL_GOOD_NUM, COL_HOUR};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;

pub const HOURS_PER_DAY: usize = 24;

const COL_SCORE: &str = "score";

/// Mean good-for-outdoor score per date and hour of day.
///
/// A cell is `None` when no classified observation exists for that date and
/// hour. `None` means "unknown", never 0 or 1.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SuitabilityMatrix {
    dates: Vec<NaiveDate>,
    cells: Vec<[Option<f64>; HOURS_PER_DAY]>,
}

impl SuitabilityMatrix {
    /// Row labels, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn get(&self, date: NaiveDate, hour: u32) -> Option<f64> {
        let row = self.dates.binary_search(&date).ok()?;
        self.cells[row].get(hour as usize).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Mean of the defined cells in each hour column.
    pub fn hourly_means(&self) -> [Option<f64>; HOURS_PER_DAY] {
        let mut means = [None; HOURS_PER_DAY];
        for (hour, mean) in means.iter_mut().enumerate() {
            let defined: Vec<f64> = self.cells.iter().filter_map(|row| row[hour]).collect();
            if !defined.is_empty() {
                *mean = Some(defined.iter().sum::<f64>() / defined.len() as f64);
            }
        }
        means
    }

    /// The hour with the highest mean score, the earliest one on ties.
    pub fn best_hour(&self) -> Option<(u32, f64)> {
        self.hourly_means()
            .iter()
            .enumerate()
            .filter_map(|(hour, mean)| mean.map(|m| (hour as u32, m)))
            .fold(None, |best, (hour, mean)| match best {
                Some((_, best_mean)) if best_mean >= mean => best,
                _ => Some((hour, mean)),
            })
    }

    /// The matrix as a table: a `date` column followed by `Float64` columns
    /// `"0"` through `"23"`, with nulls for undefined cells.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(HOURS_PER_DAY + 1);
        columns.push(Column::new(COL_DATE.into(), self.dates.clone()));
        for hour in 0..HOURS_PER_DAY {
            let values: Vec<Option<f64>> = self.cells.iter().map(|row| row[hour]).collect();
            columns.push(Column::new(hour.to_string().into(), values));
        }
        DataFrame::new(columns)
    }
}

/// Pivots classified records into a [`SuitabilityMatrix`].
///
/// Rows with a null date, hour or classification do not contribute. Several
/// observations in the same date and hour are averaged.
pub fn pivot_by_date_hour(classified: &DataFrame) -> PolarsResult<SuitabilityMatrix> {
    let grouped = classified
        .clone()
        .lazy()
        .filter(
            col(COL_DATE)
                .is_not_null()
                .and(col(COL_HOUR).is_not_null())
                .and(col(COL_HOUR).gt_eq(lit(0)))
                .and(col(COL_HOUR).lt(lit(HOURS_PER_DAY as i32))),
        )
        .group_by_stable([col(COL_DATE), col(COL_HOUR)])
        .agg([col(COL_GOOD_NUM).cast(DataType::Float64).mean().alias(COL_SCORE)])
        .collect()?;

    let dates = grouped.column(COL_DATE)?.date()?.as_date_iter();
    let hours = grouped.column(COL_HOUR)?.i32()?.into_iter();
    let scores = grouped.column(COL_SCORE)?.f64()?.into_iter();

    let mut by_date: BTreeMap<NaiveDate, [Option<f64>; HOURS_PER_DAY]> = BTreeMap::new();
    for ((date, hour), score) in dates.zip(hours).zip(scores) {
        let (Some(date), Some(hour)) = (date, hour) else {
            continue;
        };
        let row = by_date.entry(date).or_insert([None; HOURS_PER_DAY]);
        row[hour as usize] = score;
    }

    let (dates, cells): (Vec<_>, Vec<_>) = by_date.into_iter().unzip();
    Ok(SuitabilityMatrix { dates, cells })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn classified() -> DataFrame {
        df!(
            "date" => [d(2), d(1), d(1), d(1), d(2)],
            "hour" => [14, 14, 14, 15, 3],
            "good_for_outdoor_num" => [Some(1), Some(1), Some(0), Some(0), None],
        )
        .unwrap()
    }

    #[test]
    fn cells_are_means_and_dates_are_sorted() {
        let m = pivot_by_date_hour(&classified()).unwrap();
        assert_eq!(m.dates(), [d(1), d(2)]);
        assert_eq!(m.get(d(1), 14), Some(0.5));
        assert_eq!(m.get(d(1), 15), Some(0.0));
        assert_eq!(m.get(d(2), 14), Some(1.0));
    }

    #[test]
    fn unobserved_cells_are_undefined_not_zero() {
        let m = pivot_by_date_hour(&classified()).unwrap();
        assert_eq!(m.get(d(1), 0), None);
        // Only an unclassified observation at 03:00 on the 2nd.
        assert_eq!(m.get(d(2), 3), None);
        assert_eq!(m.get(d(9), 14), None);
        assert_eq!(m.get(d(1), 99), None);
    }

    #[test]
    fn dataframe_has_date_and_24_hour_columns() {
        let df = pivot_by_date_hour(&classified()).unwrap().to_dataframe().unwrap();
        assert_eq!(df.shape(), (2, 25));
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names[0], "date");
        assert_eq!(names[1], "0");
        assert_eq!(names[24], "23");

        let h14 = df.column("14").unwrap().f64().unwrap();
        assert_eq!(h14.get(0), Some(0.5));
        assert_eq!(df.column("0").unwrap().null_count(), 2);
    }

    #[test]
    fn best_hour_uses_column_means() {
        let m = pivot_by_date_hour(&classified()).unwrap();
        assert_eq!(m.hourly_means()[14], Some(0.75));
        assert_eq!(m.best_hour(), Some((14, 0.75)));
    }

    #[test]
    fn empty_input_gives_empty_matrix() {
        let m = pivot_by_date_hour(&classified().head(Some(0))).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.best_hour(), None);
        assert_eq!(m.to_dataframe().unwrap().shape(), (0, 25));
    }
}
