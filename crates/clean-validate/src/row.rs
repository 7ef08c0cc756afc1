//! Row-level orchestration of cell checks.

use clean_model::{Issue, IssueBuffer, IssueCategory, Row, RuleSet, Value};
use tracing::trace;

use crate::field::FieldValidator;

/// A row that passed normalization, tagged with its input index.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub index: usize,
    pub values: Row,
}

impl NormalizedRow {
    pub fn get(&self, column: &str) -> &Value {
        self.values.get(column).unwrap_or(&Value::Null)
    }
}

/// Runs the [`FieldValidator`] over every declared column of a row.
#[derive(Debug, Clone)]
pub struct RowNormalizer<'a> {
    rules: &'a RuleSet,
    validator: FieldValidator,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self {
            rules,
            validator: FieldValidator::default(),
        }
    }

    pub fn with_validator(mut self, validator: FieldValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Normalize input row `index`, recording issues into `issues`.
    ///
    /// Returns `None` when the primary-key cell failed; the row is then
    /// dropped and a `missing_primary_key` issue is recorded.
    pub fn normalize(
        &self,
        index: usize,
        row: &Row,
        issues: &mut IssueBuffer,
    ) -> Option<NormalizedRow> {
        let mut values = Row::new();
        let mut primary_key_failed = false;

        for (column, rule) in self.rules.fields() {
            let cell = row.get(column).unwrap_or(&Value::Null);
            let verdict = self.validator.validate(cell, rule, column, index);
            if verdict.is_rejected() && column == self.rules.primary_key() {
                primary_key_failed = true;
            }
            let (value, cell_issues) = verdict.into_parts();
            if !cell_issues.is_empty() {
                trace!(row = index, column, count = cell_issues.len(), "cell issues");
            }
            issues.extend(cell_issues);
            values.insert(column.to_string(), value);
        }

        if primary_key_failed {
            let primary_key = self.rules.primary_key();
            let rule = self.rules.get(primary_key);
            let expected = rule.map_or_else(String::new, |rule| {
                format!("parseable {}", rule.type_description())
            });
            issues.push(
                Issue::new(IssueCategory::MissingPrimaryKey, primary_key)
                    .with_row(index)
                    .with_observed(row.get(primary_key).cloned().unwrap_or_default())
                    .with_expected(expected),
            );
            trace!(row = index, "row dropped: primary key failed");
            return None;
        }

        Some(NormalizedRow { index, values })
    }
}
