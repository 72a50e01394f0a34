//! Dataset access shared by the analysis stages.
//! Column extraction and non-strict timestamp parsing on top of Polars.

use chrono::{DateTime, NaiveDateTime, Utc};
use polars::prelude::*;
use thiserror::Error;

/// Per-stage recoverable failures. A stage reporting one of these is skipped;
/// the rest of the pipeline keeps running.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("column '{0}' is missing from the dataset")]
    MissingColumn(String),
    #[error("{0} timestamp value(s) could not be parsed")]
    UnparseableTimestamps(usize),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Timestamp layouts accepted by `parse_timestamps`.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// A timestamp column parsed value-by-value. `invalid` counts non-null source
/// values that matched none of the accepted layouts.
pub struct ParsedTimestamps {
    pub values: Vec<Option<NaiveDateTime>>,
    pub invalid: usize,
}

/// Check that every named column exists, reporting the first absent one.
pub fn require_columns(df: &DataFrame, names: &[&str]) -> Result<(), StageError> {
    for name in names {
        if !df.get_column_names().iter().any(|c| c.as_str() == *name) {
            return Err(StageError::MissingColumn((*name).to_string()));
        }
    }
    Ok(())
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, StageError> {
    df.column(name)
        .map_err(|_| StageError::MissingColumn(name.to_string()))
}

/// Extract a column as `f64` values, nulls preserved.
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, StageError> {
    let col = column(df, name)?;
    let casted = col.cast(&DataType::Float64)?;
    let ca = casted.f64()?;
    Ok(ca.into_iter().collect())
}

/// Extract a column as display strings, nulls preserved. Works for any dtype;
/// string values lose their surrounding quotes.
pub fn categorical_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, StageError> {
    let col = column(df, name)?;
    let series = col.as_materialized_series();

    let mut out = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        let value = series.get(i)?;
        if value.is_null() {
            out.push(None);
        } else {
            out.push(Some(value.to_string().trim_matches('"').to_string()));
        }
    }
    Ok(out)
}

/// Parse a timestamp column non-strictly: malformed values become `None` and
/// are tallied in `invalid` instead of failing the whole column.
pub fn parse_timestamps(df: &DataFrame, name: &str) -> Result<ParsedTimestamps, StageError> {
    let col = column(df, name)?;
    let series = col.as_materialized_series();

    // Already parsed by the reader: convert from the epoch representation.
    if let DataType::Datetime(unit, _) = series.dtype() {
        let unit = *unit;
        let values: Vec<Option<NaiveDateTime>> = series
            .datetime()?
            .into_iter()
            .map(|ts| ts.and_then(|t| from_epoch(t, unit)))
            .collect();
        return Ok(ParsedTimestamps { values, invalid: 0 });
    }

    let ca = series.str()?;
    let mut invalid = 0usize;
    let values: Vec<Option<NaiveDateTime>> = ca
        .into_iter()
        .map(|opt| match opt {
            None => None,
            Some(raw) => {
                let parsed = parse_one(raw.trim());
                if parsed.is_none() {
                    invalid += 1;
                }
                parsed
            }
        })
        .collect();
    Ok(ParsedTimestamps { values, invalid })
}

fn parse_one(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn from_epoch(ts: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Milliseconds => DateTime::<Utc>::from_timestamp_millis(ts),
        TimeUnit::Microseconds => DateTime::<Utc>::from_timestamp_micros(ts),
        TimeUnit::Nanoseconds => Some(DateTime::<Utc>::from_timestamp_nanos(ts)),
    };
    dt.map(|dt| dt.naive_utc())
}
