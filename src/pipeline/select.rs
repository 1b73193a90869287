//! Field selection: project the required columns, mark absent text cells and
//! parse temporal columns.

use crate::error::{OutdoorError, SchemaError};
use log::warn;
use polars::prelude::*;
use std::collections::HashSet;

/// How a selected column is cleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text. Null and empty cells become the sentinel.
    Text,
    /// A number, possibly still stored as text. Empty text cells become
    /// null, the missing marker of numeric fields; the normalizer parses the
    /// rest.
    Numeric,
    /// A date and time of day, parsed with the given `strftime` format.
    Timestamp { format: String },
    /// A calendar date, parsed with the given `strftime` format.
    Date { format: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Text,
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Numeric,
        }
    }

    pub fn timestamp(name: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Timestamp {
                format: format.into(),
            },
        }
    }

    pub fn date(name: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Date {
                format: format.into(),
            },
        }
    }
}

/// Restricts `raw` to `fields`, in the given order.
///
/// A field listed twice is selected once. Timestamps come out as
/// `Datetime(ms)` and dates as `Date`; cells that fail to parse become null and
/// are counted in a warning rather than failing the selection.
///
/// # Errors
///
/// [`SchemaError::MissingField`] if a field is absent from `raw`, and
/// [`SchemaError::UnexpectedType`] if a temporal field has a type that cannot
/// hold a date.
pub fn select_fields(
    raw: &DataFrame,
    fields: &[FieldSpec],
    sentinel: &str,
    source_id: &str,
) -> Result<DataFrame, OutdoorError> {
    let mut seen = HashSet::new();
    let mut exprs = Vec::with_capacity(fields.len());
    let mut temporal = Vec::new();

    for field in fields {
        if !seen.insert(field.name.as_str()) {
            continue;
        }
        let column = raw.column(&field.name).map_err(|_| SchemaError::MissingField {
            source_id: source_id.to_string(),
            field: field.name.clone(),
            available: raw
                .get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
        })?;
        if matches!(field.kind, FieldKind::Timestamp { .. } | FieldKind::Date { .. }) {
            temporal.push((field.name.as_str(), column.null_count()));
        }
        exprs.push(field_expr(field, column.dtype(), sentinel, source_id)?);
    }

    let selected = raw.clone().lazy().select(exprs).collect()?;

    for (name, nulls_before) in temporal {
        let unparsed = selected.column(name)?.null_count().saturating_sub(nulls_before);
        if unparsed > 0 {
            warn!(
                "{}: {} values in '{}' could not be parsed as dates and are treated as missing",
                source_id, unparsed, name
            );
        }
    }
    Ok(selected)
}

fn field_expr(
    field: &FieldSpec,
    dtype: &DataType,
    sentinel: &str,
    source_id: &str,
) -> Result<Expr, SchemaError> {
    let c = col(field.name.as_str());
    let unexpected = |expected: &'static str| SchemaError::UnexpectedType {
        source_id: source_id.to_string(),
        field: field.name.clone(),
        dtype: dtype.clone(),
        expected,
    };

    let expr = match (&field.kind, dtype) {
        (FieldKind::Text, DataType::String) => fill_sentinel(c, sentinel),
        (FieldKind::Text, _) => fill_sentinel(c.cast(DataType::String), sentinel),
        (FieldKind::Numeric, DataType::String) => blank_to_null(c),
        (FieldKind::Numeric, _) => c,
        (FieldKind::Timestamp { .. }, DataType::Datetime(_, _)) => {
            c.cast(DataType::Datetime(TimeUnit::Milliseconds, None))
        }
        (FieldKind::Timestamp { format }, DataType::String) => c.str().to_datetime(
            Some(TimeUnit::Milliseconds),
            None,
            strptime_options(format),
            lit("raise"),
        ),
        (FieldKind::Timestamp { .. }, _) => return Err(unexpected("a timestamp")),
        (FieldKind::Date { .. }, DataType::Date) => c,
        (FieldKind::Date { .. }, DataType::Datetime(_, _)) => c.dt().date(),
        (FieldKind::Date { format }, DataType::String) => c.str().to_date(strptime_options(format)),
        (FieldKind::Date { .. }, _) => return Err(unexpected("a date")),
    };
    Ok(expr.alias(field.name.as_str()))
}

fn fill_sentinel(expr: Expr, sentinel: &str) -> Expr {
    when(expr.clone().is_null().or(expr.clone().eq(lit(""))))
        .then(lit(sentinel))
        .otherwise(expr)
}

fn blank_to_null(expr: Expr) -> Expr {
    when(expr.clone().eq(lit("")))
        .then(lit(NULL).cast(DataType::String))
        .otherwise(expr)
}

fn strptime_options(format: &str) -> StrptimeOptions {
    StrptimeOptions {
        format: Some(format.into()),
        strict: false,
        exact: true,
        cache: true,
    }
}

/// Adds a `Date` column holding the calendar date of a timestamp column.
pub fn derive_calendar_date(df: DataFrame, timestamp: &str, date: &str) -> PolarsResult<DataFrame> {
    df.lazy()
        .with_column(col(timestamp).dt().date().alias(date))
        .collect()
}
