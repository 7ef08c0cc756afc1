//! Per-cell type checks and coercion.
//!
//! A cell goes through presence, type, coercion, range/length, character
//! class, and finally array-element recursion. The first failing step
//! rejects the cell; later steps are skipped.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use clean_model::{CaseFold, FieldRule, FieldType, Issue, IssueCategory, Value, Violation};
use regex::Regex;

/// Signed decimal, optionally followed by a zero fraction (`12`, `-3`, `4.00`).
static INTEGER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?\d+)(?:\.0+)?$").expect("Invalid integer regex"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
/// Timestamps keep only their date; `%.f` also matches no fraction.
/// The space-separated form is how Polars renders `Datetime` cells.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Outcome of validating one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellVerdict {
    /// The cell was already canonical (or null and optional, replaced by its default).
    Accepted(Value),
    /// The cell was coerced; `notes` are `cleaned_cases` issues.
    Normalized { value: Value, notes: Vec<Issue> },
    /// The cell failed a check and is replaced by the column default.
    Rejected { replacement: Value, issue: Issue },
}

impl CellVerdict {
    pub fn value(&self) -> &Value {
        match self {
            CellVerdict::Accepted(value) | CellVerdict::Normalized { value, .. } => value,
            CellVerdict::Rejected { replacement, .. } => replacement,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, CellVerdict::Rejected { .. })
    }

    /// Output value plus every issue the cell produced.
    pub fn into_parts(self) -> (Value, Vec<Issue>) {
        match self {
            CellVerdict::Accepted(value) => (value, Vec::new()),
            CellVerdict::Normalized { value, notes } => (value, notes),
            CellVerdict::Rejected { replacement, issue } => (replacement, vec![issue]),
        }
    }
}

struct Failure {
    column: String,
    observed: Value,
    violation: Violation,
}

impl Failure {
    fn new(column: &str, observed: &Value, violation: Violation) -> Self {
        Self {
            column: column.to_string(),
            observed: observed.clone(),
            violation,
        }
    }

    fn into_issue(self, row_index: usize) -> Issue {
        Issue::new(self.violation.category, self.column)
            .with_row(row_index)
            .with_observed(self.observed)
            .with_expected(self.violation.expected)
    }
}

struct Note {
    column: String,
    observed: Value,
    expected: String,
}

impl Note {
    fn into_issue(self, row_index: usize) -> Issue {
        Issue::new(IssueCategory::CleanedCases, self.column)
            .with_row(row_index)
            .with_observed(self.observed)
            .with_expected(self.expected)
    }
}

/// Checks single cells against their [`FieldRule`].
#[derive(Debug, Clone, Copy)]
pub struct FieldValidator {
    trim_strings: bool,
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self { trim_strings: true }
    }
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether string cells are stripped of surrounding whitespace.
    pub fn with_trim(mut self, trim_strings: bool) -> Self {
        self.trim_strings = trim_strings;
        self
    }

    /// Validate `value` in `column` of input row `row_index`.
    pub fn validate(
        &self,
        value: &Value,
        rule: &FieldRule,
        column: &str,
        row_index: usize,
    ) -> CellVerdict {
        if value.is_null() && !rule.is_required() {
            return CellVerdict::Accepted(rule.default_value());
        }
        let mut notes = Vec::new();
        match self.check(value, rule, column, &mut notes) {
            Ok(clean) if notes.is_empty() => CellVerdict::Accepted(clean),
            Ok(clean) => CellVerdict::Normalized {
                value: clean,
                notes: notes
                    .into_iter()
                    .map(|note| note.into_issue(row_index))
                    .collect(),
            },
            Err(failure) => CellVerdict::Rejected {
                replacement: rule.default_value(),
                issue: failure.into_issue(row_index),
            },
        }
    }

    fn check(
        &self,
        value: &Value,
        rule: &FieldRule,
        path: &str,
        notes: &mut Vec<Note>,
    ) -> Result<Value, Failure> {
        if value.is_null() {
            return Err(Failure::new(
                path,
                value,
                Violation::new(
                    IssueCategory::NullIssues,
                    format!("non-null {}", rule.type_description()),
                ),
            ));
        }

        let coerced = self.coerce(value, rule, path, notes)?;
        rule.check_constraints(&coerced)
            .map_err(|violation| Failure::new(path, value, violation))?;

        match (coerced, rule.element_rule()) {
            (Value::Array(items), Some(element)) => {
                let mut clean = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{idx}]");
                    clean.push(self.check_element(item, &element, &item_path, notes)?);
                }
                Ok(Value::Array(clean))
            }
            (coerced, _) => Ok(coerced),
        }
    }

    /// Element failures are filed under the element type's category.
    fn check_element(
        &self,
        item: &Value,
        element: &FieldRule,
        path: &str,
        notes: &mut Vec<Note>,
    ) -> Result<Value, Failure> {
        self.check(item, element, path, notes).map_err(|mut failure| {
            if failure.violation.category == IssueCategory::NullIssues {
                failure.violation.category = element.field_type.issue_category();
            }
            failure
        })
    }

    fn coerce(
        &self,
        value: &Value,
        rule: &FieldRule,
        path: &str,
        notes: &mut Vec<Note>,
    ) -> Result<Value, Failure> {
        let coerced = match rule.field_type {
            FieldType::String => self.coerce_string(value, rule.case),
            FieldType::Integer => coerce_integer(value),
            FieldType::Boolean => coerce_boolean(value),
            FieldType::Date => coerce_date(value),
            FieldType::Array => coerce_array(value),
        };
        let Some(coerced) = coerced else {
            return Err(Failure::new(
                path,
                value,
                Violation::new(rule.field_type.issue_category(), rule.type_description()),
            ));
        };
        if &coerced != value {
            notes.push(Note {
                column: path.to_string(),
                observed: value.clone(),
                expected: canonical_description(rule),
            });
        }
        Ok(coerced)
    }

    fn coerce_string(&self, value: &Value, case: Option<CaseFold>) -> Option<Value> {
        let text = match value {
            Value::Text(text) if self.trim_strings => text.trim().to_string(),
            Value::Text(text) => text.clone(),
            Value::Integer(number) => number.to_string(),
            Value::Float(number) if number.is_finite() => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Date(date) => date.format("%Y-%m-%d").to_string(),
            _ => return None,
        };
        Some(Value::Text(match case {
            Some(case) => case.apply(&text),
            None => text,
        }))
    }
}

fn canonical_description(rule: &FieldRule) -> String {
    match (rule.field_type, rule.case) {
        (FieldType::String, Some(case)) => format!("trimmed {}-case string", case.as_str()),
        (FieldType::String, None) => "trimmed string".to_string(),
        _ => rule.type_description(),
    }
}

fn coerce_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Integer(_) => Some(value.clone()),
        Value::Float(number) => float_to_i64(*number).map(Value::Integer),
        Value::Text(text) => parse_integer(text).map(Value::Integer),
        _ => None,
    }
}

/// Parse a signed decimal string; a zero fraction (`"4.0"`) is accepted.
pub fn parse_integer(text: &str) -> Option<i64> {
    let captures = INTEGER_PATTERN.captures(text.trim())?;
    captures.get(1)?.as_str().parse().ok()
}

fn float_to_i64(number: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    let in_range = number >= i64::MIN as f64 && number < i64::MAX as f64;
    (number.is_finite() && number.fract() == 0.0 && in_range).then_some(number as i64)
}

fn coerce_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::Integer(0) => Some(Value::Bool(false)),
        Value::Integer(1) => Some(Value::Bool(true)),
        Value::Text(text) => parse_boolean(text).map(Value::Bool),
        _ => None,
    }
}

/// Case-insensitive `true/false/yes/no/y/n/1/0`.
pub fn parse_boolean(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn coerce_date(value: &Value) -> Option<Value> {
    match value {
        Value::Date(_) => Some(value.clone()),
        Value::Text(text) => parse_date(text).map(Value::Date),
        _ => None,
    }
}

/// Parse `YYYY-MM-DD`, `DD/MM/YYYY`, or a `YYYY-MM-DD[T ]HH:MM:SS` timestamp.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DATETIME_FORMATS.iter().find_map(|format| {
                NaiveDateTime::parse_from_str(text, format)
                    .ok()
                    .map(|datetime| datetime.date())
            })
        })
}

fn coerce_array(value: &Value) -> Option<Value> {
    match value {
        Value::Array(_) => Some(value.clone()),
        Value::Text(text) => match serde_json::from_str::<Value>(text.trim()) {
            Ok(parsed @ Value::Array(_)) => Some(parsed),
            _ => None,
        },
        _ => None,
    }
}
