//! Numeric coercion of merged records.
//!
//! Values that cannot be read as numbers (station flags, stray text)
//! become null. The conversion is lossy and only logged: a column full of
//! unparsable values looks exactly like a column of missing readings.

use crate::config::MissingPolicy;
use crate::error::{OutdoorError, SchemaError};
use log::warn;
use polars::prelude::*;

/// Casts each of `fields` to `Float64`, mapping unparsable cells to null.
///
/// Columns that are already `Float64` are left untouched, so applying this
/// twice is the same as applying it once.
pub fn coerce_numeric(
    df: &DataFrame,
    fields: &[&str],
    source_id: &str,
) -> Result<DataFrame, OutdoorError> {
    let mut exprs = Vec::new();
    let mut text_fields = Vec::new();

    for &field in fields {
        let column = df.column(field).map_err(|_| SchemaError::MissingField {
            source_id: source_id.to_string(),
            field: field.to_string(),
            available: df
                .get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
        })?;
        match column.dtype() {
            DataType::Float64 => {}
            DataType::String => {
                text_fields.push(field);
                exprs.push(col(field).cast(DataType::Float64));
            }
            dtype if dtype.is_integer() || dtype.is_float() || *dtype == DataType::Null => {
                exprs.push(col(field).cast(DataType::Float64));
            }
            dtype => {
                return Err(SchemaError::UnexpectedType {
                    source_id: source_id.to_string(),
                    field: field.to_string(),
                    dtype: dtype.clone(),
                    expected: "a number",
                }
                .into())
            }
        }
    }

    if exprs.is_empty() {
        return Ok(df.clone());
    }
    let coerced = df.clone().lazy().with_columns(exprs).collect()?;

    for field in text_fields {
        let unparsed = count_unparsed(df.column(field)?, coerced.column(field)?);
        if unparsed > 0 {
            warn!(
                "{}: {} values in '{}' are not numbers and are treated as missing",
                source_id, unparsed, field
            );
        }
    }
    Ok(coerced)
}

/// Cells that held a value before coercion and are null after it.
///
/// Blank cells are already null when they reach the normalizer, so only
/// values that failed to parse are counted.
fn count_unparsed(before: &Column, after: &Column) -> usize {
    after.null_count().saturating_sub(before.null_count())
}

/// The value of `field` as the classifier sees it.
///
/// Under [`MissingPolicy::ScoreAsZero`] a missing value reads as `0.0`. The
/// substitution exists only inside this expression; the column itself keeps
/// its nulls.
pub fn scoring_input(field: &str, policy: MissingPolicy) -> Expr {
    match policy {
        MissingPolicy::ScoreAsZero => col(field).fill_null(lit(0.0)),
        MissingPolicy::Exclude => col(field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn text_numbers_are_parsed_and_junk_becomes_null() {
        let df = df!(
            "temp_c" => ["20.5", "N/A", "-3", "M"],
            "total_precip_mm" => [Some(0.0), None, Some(2.0), Some(0.2)],
        )
        .unwrap();
        let out = coerce_numeric(&df, &["temp_c", "total_precip_mm"], "merged").unwrap();
        assert_eq!(values(&out, "temp_c"), [Some(20.5), None, Some(-3.0), None]);
        assert_eq!(
            values(&out, "total_precip_mm"),
            [Some(0.0), None, Some(2.0), Some(0.2)]
        );
    }

    #[test]
    fn only_real_junk_counts_as_unparsed() {
        use crate::pipeline::select::{select_fields, FieldSpec};

        let raw = df!("Temp (°C)" => [Some("20"), Some(""), Some("M"), None]).unwrap();
        let selected =
            select_fields(&raw, &[FieldSpec::numeric("Temp (°C)")], "N/A", "hourly").unwrap();
        let coerced = coerce_numeric(&selected, &["Temp (°C)"], "hourly").unwrap();

        let before = selected.column("Temp (°C)").unwrap();
        let after = coerced.column("Temp (°C)").unwrap();
        assert_eq!(count_unparsed(before, after), 1);
        assert_eq!(values(&coerced, "Temp (°C)"), [Some(20.0), None, None, None]);
    }

    #[test]
    fn integers_and_all_null_columns_become_floats() {
        let df = df!(
            "a" => [1i64, 2],
            "b" => [None::<i32>, None],
        )
        .unwrap();
        let df = df
            .lazy()
            .with_column(lit(NULL).alias("c"))
            .collect()
            .unwrap();
        let out = coerce_numeric(&df, &["a", "b", "c"], "merged").unwrap();
        assert_eq!(values(&out, "a"), [Some(1.0), Some(2.0)]);
        assert_eq!(out.column("c").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn normalizing_numeric_columns_is_a_no_op() {
        let df = df!("temp_c" => [Some(1.5), None, Some(30.0)]).unwrap();
        let once = coerce_numeric(&df, &["temp_c"], "merged").unwrap();
        let twice = coerce_numeric(&once, &["temp_c"], "merged").unwrap();
        assert!(df.equals_missing(&once));
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn booleans_are_not_numbers() {
        let df = df!("flag" => [true, false]).unwrap();
        let err = coerce_numeric(&df, &["flag"], "merged").unwrap_err();
        assert!(matches!(err, OutdoorError::Schema(SchemaError::UnexpectedType { .. })));
    }

    #[test]
    fn zero_substitution_is_scoped_to_the_expression() {
        let df = df!("total_precip_mm" => [None, Some(1.0)]).unwrap();
        let scored = df
            .clone()
            .lazy()
            .select([scoring_input("total_precip_mm", MissingPolicy::ScoreAsZero).alias("x")])
            .collect()
            .unwrap();
        assert_eq!(values(&scored, "x"), [Some(0.0), Some(1.0)]);
        assert_eq!(df.column("total_precip_mm").unwrap().null_count(), 1);

        let kept = df
            .lazy()
            .select([scoring_input("total_precip_mm", MissingPolicy::Exclude).alias("x")])
            .collect()
            .unwrap();
        assert_eq!(values(&kept, "x"), [None, Some(1.0)]);
    }
}
