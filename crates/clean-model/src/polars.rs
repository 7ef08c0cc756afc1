//! Polars interop for [`Frame`].
//!
//! Sources usually arrive as Polars DataFrames. These helpers move cells
//! between Polars `AnyValue`s and [`Value`]s: list columns become arrays,
//! `Date` columns become dates, and every other dtype maps by scalar kind.

use chrono::{Days, NaiveDate};
use polars::prelude::*;

use crate::error::FrameError;
use crate::frame::{Frame, Row};
use crate::value::Value;

/// Converts a Polars `AnyValue` to a [`Value`].
///
/// Other dtypes fall back to their display string. `Datetime` cells render
/// as `YYYY-MM-DD HH:MM:SS`, which date columns accept.
pub fn any_to_value(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(flag) => Value::Bool(flag),
        AnyValue::Int8(v) => Value::Integer(i64::from(v)),
        AnyValue::Int16(v) => Value::Integer(i64::from(v)),
        AnyValue::Int32(v) => Value::Integer(i64::from(v)),
        AnyValue::Int64(v) => Value::Integer(v),
        AnyValue::UInt8(v) => Value::Integer(i64::from(v)),
        AnyValue::UInt16(v) => Value::Integer(i64::from(v)),
        AnyValue::UInt32(v) => Value::Integer(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).map_or(Value::Float(v as f64), Value::Integer),
        AnyValue::Float32(v) => Value::Float(f64::from(v)),
        AnyValue::Float64(v) => Value::Float(v),
        AnyValue::String(s) => Value::Text(s.to_string()),
        AnyValue::StringOwned(s) => Value::Text(s.to_string()),
        AnyValue::Date(days) => date_from_epoch_days(days).map_or(Value::Null, Value::Date),
        AnyValue::List(series) => Value::Array(series_values(&series)),
        other => Value::Text(other.to_string()),
    }
}

/// Converts a [`Value`] to an owned Polars `AnyValue`.
pub fn value_to_any(value: &Value) -> PolarsResult<AnyValue<'static>> {
    Ok(match value {
        Value::Null => AnyValue::Null,
        Value::Bool(flag) => AnyValue::Boolean(*flag),
        Value::Integer(v) => AnyValue::Int64(*v),
        Value::Float(v) => AnyValue::Float64(*v),
        Value::Text(text) => AnyValue::StringOwned(text.as_str().into()),
        Value::Date(date) => AnyValue::Date(epoch_days(*date)),
        Value::Array(items) => {
            let inner = items
                .iter()
                .map(value_to_any)
                .collect::<PolarsResult<Vec<_>>>()?;
            AnyValue::List(Series::from_any_values("".into(), &inner, false)?)
        }
    })
}

fn series_values(series: &Series) -> Vec<Value> {
    (0..series.len())
        .map(|idx| any_to_value(series.get(idx).unwrap_or(AnyValue::Null)))
        .collect()
}

fn epoch_days(date: NaiveDate) -> i32 {
    let days = date.signed_duration_since(NaiveDate::default()).num_days();
    i32::try_from(days).unwrap_or(if days < 0 { i32::MIN } else { i32::MAX })
}

fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    let epoch = NaiveDate::default();
    let offset = Days::new(u64::from(days.unsigned_abs()));
    if days >= 0 {
        epoch.checked_add_days(offset)
    } else {
        epoch.checked_sub_days(offset)
    }
}

impl Frame {
    /// Copy a Polars DataFrame into a frame, preserving column order.
    pub fn from_polars(df: &DataFrame) -> Result<Self, FrameError> {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut rows = vec![Row::new(); df.height()];
        for column in df.get_columns() {
            let name = column.name().to_string();
            for (idx, row) in rows.iter_mut().enumerate() {
                let value = column.get(idx).unwrap_or(AnyValue::Null);
                row.insert(name.clone(), any_to_value(value));
            }
        }
        Frame::new(columns, rows)
    }

    /// Copy the frame into a Polars DataFrame.
    ///
    /// Each column takes the supertype of its cells; columns mixing
    /// incompatible kinds fail with a Polars error.
    pub fn to_polars(&self) -> Result<DataFrame, FrameError> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.width());
        for name in self.columns() {
            let values = self
                .rows()
                .iter()
                .map(|row| value_to_any(row.get(name).unwrap_or(&Value::Null)))
                .collect::<PolarsResult<Vec<_>>>()?;
            let series = Series::from_any_values(name.as_str().into(), &values, false)?;
            columns.push(series.into());
        }
        Ok(DataFrame::new(columns)?)
    }
}
