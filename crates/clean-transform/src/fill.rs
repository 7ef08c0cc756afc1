//! Column-fill transforms.

use clean_model::{Frame, FrameError, Issue, IssueCategory, Value};
use tracing::debug;

use crate::step::{PreTransform, TransformOutput};

/// Adds each configured column that the frame lacks, filled with a constant.
///
/// Columns already present are left untouched. One issue is emitted per
/// added column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddMissingFields {
    fields: Vec<(String, Value)>,
}

impl AddMissingFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, column: impl Into<String>, fill: impl Into<Value>) -> Self {
        self.fields.push((column.into(), fill.into()));
        self
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}

impl PreTransform for AddMissingFields {
    fn name(&self) -> &str {
        "add_missing_fields"
    }

    fn apply(&self, frame: &Frame) -> Result<TransformOutput, FrameError> {
        let mut out = frame.clone();
        let mut issues = Vec::new();
        for (column, fill) in &self.fields {
            if out.has_column(column) {
                continue;
            }
            out.add_column(column.clone(), fill.clone())?;
            debug!(column = %column, rows = out.height(), "added missing field");
            issues.push(
                Issue::new(IssueCategory::FieldAdded, column.clone())
                    .with_observed(fill.clone())
                    .with_expected(format!("column added with {fill}")),
            );
        }
        Ok(TransformOutput::new(out).with_issues(issues))
    }
}

/// Replaces null cells of an existing column with a constant.
///
/// A missing column is left alone; [`AddMissingFields`] covers that case.
#[derive(Debug, Clone, PartialEq)]
pub struct FillNulls {
    column: String,
    fill: Value,
}

impl FillNulls {
    pub fn new(column: impl Into<String>, fill: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            fill: fill.into(),
        }
    }
}

impl PreTransform for FillNulls {
    fn name(&self) -> &str {
        "fill_nulls"
    }

    fn apply(&self, frame: &Frame) -> Result<TransformOutput, FrameError> {
        let mut out = frame.clone();
        let mut issues = Vec::new();
        if !out.has_column(&self.column) {
            return Ok(TransformOutput::new(out));
        }
        let null_rows: Vec<usize> = out
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| row.get(&self.column).is_none_or(Value::is_null))
            .map(|(idx, _)| idx)
            .collect();
        for idx in null_rows {
            out.set(idx, &self.column, self.fill.clone())?;
            issues.push(
                Issue::new(IssueCategory::FieldAdded, self.column.clone())
                    .with_row(idx)
                    .with_expected(format!("null filled with {}", self.fill)),
            );
        }
        debug!(column = %self.column, filled = issues.len(), "filled null cells");
        Ok(TransformOutput::new(out).with_issues(issues))
    }
}
