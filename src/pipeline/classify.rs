use crate::config::{MissingPolicy, Thresholds};
use crate::pipeline::columns::{
    COL_GOOD, COL_GOOD_NUM, COL_HOUR, COL_TEMP, COL_TIMESTAMP, COL_TOTAL_PRECIP,
};
use crate::pipeline::normalize::scoring_input;
use polars::prelude::*;

/// Whether a single reading is comfortable for being outside.
///
/// Both temperature bounds are inclusive, as is the precipitation limit.
///
/// ```
/// use outdoor_hours::{is_good_for_outdoor, Thresholds};
///
/// let t = Thresholds::default();
/// assert!(is_good_for_outdoor(15.0, 0.0, &t));
/// assert!(!is_good_for_outdoor(25.1, 0.0, &t));
/// assert!(!is_good_for_outdoor(20.0, 0.01, &t));
/// ```
pub fn is_good_for_outdoor(temp_c: f64, precip_mm: f64, thresholds: &Thresholds) -> bool {
    (thresholds.temp_min..=thresholds.temp_max).contains(&temp_c)
        && precip_mm <= thresholds.max_precip
}

/// [`is_good_for_outdoor`] as a column expression.
///
/// Under [`MissingPolicy::Exclude`] the result is null whenever either input is
/// null; under [`MissingPolicy::ScoreAsZero`] nulls read as `0.0`.
pub fn good_for_outdoor_expr(
    temp: &str,
    precip: &str,
    thresholds: &Thresholds,
    policy: MissingPolicy,
) -> Expr {
    let t = scoring_input(temp, policy);
    let p = scoring_input(precip, policy);
    let predicate = t
        .clone()
        .gt_eq(lit(thresholds.temp_min))
        .and(t.lt_eq(lit(thresholds.temp_max)))
        .and(p.lt_eq(lit(thresholds.max_precip)));

    match policy {
        MissingPolicy::ScoreAsZero => predicate,
        MissingPolicy::Exclude => when(col(temp).is_null().or(col(precip).is_null()))
            .then(lit(NULL).cast(DataType::Boolean))
            .otherwise(predicate),
    }
}

/// Adds the hour-of-day bucket and the classification columns.
///
/// Expects the merged record columns; adds `hour` (`Int32`, 0–23),
/// `good_for_outdoor` (`Boolean`) and `good_for_outdoor_num` (`Int32`, 0 or 1).
pub fn classify(
    merged: DataFrame,
    thresholds: &Thresholds,
    policy: MissingPolicy,
) -> PolarsResult<DataFrame> {
    merged
        .lazy()
        .with_columns([
            col(COL_TIMESTAMP).dt().hour().cast(DataType::Int32).alias(COL_HOUR),
            good_for_outdoor_expr(COL_TEMP, COL_TOTAL_PRECIP, thresholds, policy).alias(COL_GOOD),
        ])
        .with_column(col(COL_GOOD).cast(DataType::Int32).alias(COL_GOOD_NUM))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert!(is_good_for_outdoor(15.0, 0.0, &t()));
        assert!(!is_good_for_outdoor(14.9, 0.0, &t()));
        assert!(is_good_for_outdoor(25.0, 0.0, &t()));
        assert!(!is_good_for_outdoor(25.1, 0.0, &t()));
        assert!(!is_good_for_outdoor(20.0, 0.01, &t()));
    }

    #[test]
    fn nan_is_never_good() {
        assert!(!is_good_for_outdoor(f64::NAN, 0.0, &t()));
        assert!(!is_good_for_outdoor(20.0, f64::NAN, &t()));
    }

    #[test]
    fn thresholds_are_parameters() {
        let warm = Thresholds {
            temp_min: 20.0,
            temp_max: 30.0,
            max_precip: 1.0,
        };
        assert!(is_good_for_outdoor(28.0, 0.5, &warm));
        assert!(!is_good_for_outdoor(18.0, 0.0, &warm));
    }

    #[test]
    fn expression_agrees_with_scalar_predicate() {
        let cases = [
            (15.0, 0.0),
            (14.9, 0.0),
            (25.0, 0.0),
            (25.1, 0.0),
            (20.0, 0.01),
            (-5.0, 0.0),
        ];
        let df = df!(
            "temp_c" => cases.iter().map(|c| c.0).collect::<Vec<_>>(),
            "total_precip_mm" => cases.iter().map(|c| c.1).collect::<Vec<_>>(),
        )
        .unwrap();
        let out = df
            .lazy()
            .select([good_for_outdoor_expr(
                "temp_c",
                "total_precip_mm",
                &t(),
                MissingPolicy::ScoreAsZero,
            )
            .alias("g")])
            .collect()
            .unwrap();
        let got: Vec<Option<bool>> = out.column("g").unwrap().bool().unwrap().into_iter().collect();
        let expected: Vec<Option<bool>> = cases
            .iter()
            .map(|(temp, precip)| Some(is_good_for_outdoor(*temp, *precip, &t())))
            .collect();
        assert_eq!(got, expected);
    }

    fn merged_with_gaps() -> DataFrame {
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let ts: Vec<_> = [9, 10, 11]
            .iter()
            .map(|h| day.and_hms_opt(*h, 0, 0).unwrap())
            .collect();
        df!(
            "timestamp" => ts,
            "temp_c" => [Some(20.0), None, Some(20.0)],
            "total_precip_mm" => [None, Some(0.0), Some(0.0)],
        )
        .unwrap()
    }

    #[test]
    fn score_as_zero_treats_missing_as_zero() {
        let out = classify(merged_with_gaps(), &t(), MissingPolicy::ScoreAsZero).unwrap();
        let good: Vec<Option<bool>> = out
            .column("good_for_outdoor")
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        // Missing precipitation reads as dry; missing temperature reads as 0 °C.
        assert_eq!(good, [Some(true), Some(false), Some(true)]);
        let num: Vec<Option<i32>> = out
            .column("good_for_outdoor_num")
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(num, [Some(1), Some(0), Some(1)]);
        // The inputs keep their nulls.
        assert_eq!(out.column("temp_c").unwrap().null_count(), 1);
    }

    #[test]
    fn exclude_leaves_missing_inputs_unclassified() {
        let out = classify(merged_with_gaps(), &t(), MissingPolicy::Exclude).unwrap();
        let good: Vec<Option<bool>> = out
            .column("good_for_outdoor")
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(good, [None, None, Some(true)]);
    }

    #[test]
    fn hour_bucket_comes_from_timestamp() {
        let out = classify(merged_with_gaps(), &t(), MissingPolicy::ScoreAsZero).unwrap();
        let hours: Vec<Option<i32>> =
            out.column("hour").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(hours, [Some(9), Some(10), Some(11)]);
    }
}
