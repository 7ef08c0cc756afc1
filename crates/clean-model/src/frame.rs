//! In-memory tabular frame.
//!
//! The pipeline only needs column introspection, column add with a scalar
//! fill, ordered row iteration, copy, and row drop. [`Frame`] provides exactly
//! that over heterogeneous [`Value`] cells. Conversion to and from Polars
//! lives in [`crate::polars`].

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::FrameError;
use crate::value::Value;

/// One record: column name to cell. Column order lives on the frame.
pub type Row = BTreeMap<String, Value>;

/// Ordered columns over ordered rows.
///
/// Every row holds exactly the frame's columns; cells a caller leaves out
/// are stored as [`Value::Null`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Frame {
    /// Build a frame, rejecting duplicate columns and row keys outside `columns`.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, FrameError> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(FrameError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }
        let mut frame = Self {
            columns,
            rows: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            frame.push_row(row)?;
        }
        Ok(frame)
    }

    /// Build a frame whose columns are the union of the record keys, in
    /// first-seen order.
    pub fn from_records(records: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut seen = BTreeSet::new();
        for record in &records {
            for column in record.keys() {
                if seen.insert(column.clone()) {
                    columns.push(column.clone());
                }
            }
        }
        let rows = records
            .into_iter()
            .map(|mut record| {
                for column in &columns {
                    record.entry(column.clone()).or_insert(Value::Null);
                }
                record
            })
            .collect();
        Self { columns, rows }
    }

    /// An empty frame with the given columns.
    pub fn with_columns<I, S>(columns: I) -> Result<Self, FrameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(columns.into_iter().map(Into::into).collect(), Vec::new())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|name| name == column)
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|record| record.get(column))
    }

    /// Values of one column in row order.
    pub fn column_values(&self, column: &str) -> Option<Vec<&Value>> {
        if !self.has_column(column) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|row| row.get(column).unwrap_or(&Value::Null))
                .collect(),
        )
    }

    /// Append a column filled with `fill` in every row.
    pub fn add_column(&mut self, column: impl Into<String>, fill: Value) -> Result<(), FrameError> {
        let column = column.into();
        if self.has_column(&column) {
            return Err(FrameError::DuplicateColumn { column });
        }
        for row in &mut self.rows {
            row.insert(column.clone(), fill.clone());
        }
        self.columns.push(column);
        Ok(())
    }

    /// Remove a column; returns false when it was not present.
    pub fn drop_column(&mut self, column: &str) -> bool {
        let Some(position) = self.columns.iter().position(|name| name == column) else {
            return false;
        };
        self.columns.remove(position);
        for row in &mut self.rows {
            row.remove(column);
        }
        true
    }

    /// Overwrite one cell.
    pub fn set(&mut self, row: usize, column: &str, value: Value) -> Result<(), FrameError> {
        if !self.has_column(column) {
            return Err(FrameError::UnknownColumn {
                column: column.to_string(),
            });
        }
        let record = self
            .rows
            .get_mut(row)
            .ok_or(FrameError::RowOutOfBounds { row })?;
        record.insert(column.to_string(), value);
        Ok(())
    }

    /// Append a row; missing cells become null.
    pub fn push_row(&mut self, mut row: Row) -> Result<(), FrameError> {
        if let Some(column) = row.keys().find(|key| !self.has_column(key)) {
            return Err(FrameError::UnexpectedColumn {
                row: self.rows.len(),
                column: column.clone(),
            });
        }
        for column in &self.columns {
            row.entry(column.clone()).or_insert(Value::Null);
        }
        self.rows.push(row);
        Ok(())
    }

    /// Keep only rows for which `keep(index, row)` is true.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize, &Row) -> bool,
    {
        let mut index = 0;
        self.rows.retain(|row| {
            let kept = keep(index, row);
            index += 1;
            kept
        });
    }
}

/// Build a [`Row`] from `(column, value)` pairs.
pub fn row<I, K, V>(cells: I) -> Row
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    cells
        .into_iter()
        .map(|(column, value)| (column.into(), value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::new(
            vec!["id".to_string(), "name".to_string()],
            vec![
                row([("id", Value::from(1)), ("name", Value::from("a"))]),
                row([("id", Value::from(2))]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn missing_cells_read_as_null() {
        let frame = sample();
        assert_eq!(frame.get(1, "name"), Some(&Value::Null));
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.width(), 2);
    }

    #[test]
    fn rejects_duplicate_columns() {
        let err = Frame::new(vec!["id".to_string(), "id".to_string()], Vec::new()).unwrap_err();
        assert!(matches!(err, FrameError::DuplicateColumn { column } if column == "id"));
    }

    #[test]
    fn rejects_undeclared_cells() {
        let err = Frame::new(
            vec!["id".to_string()],
            vec![row([("id", Value::from(1)), ("extra", Value::from(2))])],
        )
        .unwrap_err();
        assert!(matches!(err, FrameError::UnexpectedColumn { row: 0, .. }));
    }

    #[test]
    fn records_union_columns_in_first_seen_order() {
        let frame = Frame::from_records(vec![
            row([("b", Value::from(1))]),
            row([("a", Value::from(2)), ("b", Value::from(3))]),
        ]);
        assert_eq!(frame.columns(), ["b".to_string(), "a".to_string()]);
        assert_eq!(frame.get(0, "a"), Some(&Value::Null));
    }

    #[test]
    fn add_and_drop_columns() {
        let mut frame = sample();
        frame.add_column("tags", Value::from(Vec::<i64>::new())).unwrap();
        assert_eq!(frame.get(1, "tags"), Some(&Value::Array(Vec::new())));
        assert!(frame.add_column("tags", Value::Null).is_err());

        assert!(frame.drop_column("name"));
        assert!(!frame.drop_column("name"));
        assert_eq!(frame.columns(), ["id".to_string(), "tags".to_string()]);
        assert!(frame.row(0).is_some_and(|r| !r.contains_key("name")));
    }

    #[test]
    fn retain_rows_sees_original_indices() {
        let mut frame = sample();
        frame.retain_rows(|index, _| index == 1);
        assert_eq!(frame.height(), 1);
        assert_eq!(frame.get(0, "id"), Some(&Value::Integer(2)));
    }

    #[test]
    fn set_checks_bounds() {
        let mut frame = sample();
        frame.set(0, "name", Value::from("z")).unwrap();
        assert_eq!(frame.get(0, "name"), Some(&Value::from("z")));
        assert!(matches!(
            frame.set(9, "name", Value::Null),
            Err(FrameError::RowOutOfBounds { row: 9 })
        ));
        assert!(matches!(
            frame.set(0, "missing", Value::Null),
            Err(FrameError::UnknownColumn { .. })
        ));
    }
}
