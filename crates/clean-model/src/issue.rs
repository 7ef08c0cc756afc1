//! Data-defect records.
//!
//! Every anomaly found while cleaning becomes an [`Issue`] filed under an
//! [`IssueCategory`]. Category names shown to users are the entity prefix
//! joined to the category suffix, e.g. `tra_null_issues`.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::value::Value;

/// Advisory severity; it never changes pipeline behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Info,
    Warning,
    Error,
}

impl IssueSeverity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Closed set of issue buckets.
///
/// Declaration order is report order. `Transform` holds a caller-named
/// bucket for issues emitted by pre-transforms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueCategory {
    MissingColumns,
    UnknownColumns,
    NullIssues,
    StringIssues,
    IntegerIssues,
    BooleanIssues,
    DateIssues,
    ArrayIssues,
    LengthIssues,
    SpecialCharIssues,
    CleanedCases,
    UniquenessViolations,
    Duplicates,
    MissingPrimaryKey,
    FieldAdded,
    Transform(String),
}

impl IssueCategory {
    /// Every built-in category, in report order.
    pub const BUILT_IN: [IssueCategory; 15] = [
        IssueCategory::MissingColumns,
        IssueCategory::UnknownColumns,
        IssueCategory::NullIssues,
        IssueCategory::StringIssues,
        IssueCategory::IntegerIssues,
        IssueCategory::BooleanIssues,
        IssueCategory::DateIssues,
        IssueCategory::ArrayIssues,
        IssueCategory::LengthIssues,
        IssueCategory::SpecialCharIssues,
        IssueCategory::CleanedCases,
        IssueCategory::UniquenessViolations,
        IssueCategory::Duplicates,
        IssueCategory::MissingPrimaryKey,
        IssueCategory::FieldAdded,
    ];

    pub fn suffix(&self) -> &str {
        match self {
            Self::MissingColumns => "missing_columns",
            Self::UnknownColumns => "unknown_columns",
            Self::NullIssues => "null_issues",
            Self::StringIssues => "string_issues",
            Self::IntegerIssues => "integer_issues",
            Self::BooleanIssues => "boolean_issues",
            Self::DateIssues => "date_issues",
            Self::ArrayIssues => "array_issues",
            Self::LengthIssues => "length_issues",
            Self::SpecialCharIssues => "special_char_issues",
            Self::CleanedCases => "cleaned_cases",
            Self::UniquenessViolations => "uniqueness_violations",
            Self::Duplicates => "duplicates",
            Self::MissingPrimaryKey => "missing_primary_key",
            Self::FieldAdded => "field_added",
            Self::Transform(suffix) => suffix,
        }
    }

    /// Resolve a suffix; unknown suffixes name a transform bucket.
    pub fn from_suffix(suffix: &str) -> Self {
        Self::BUILT_IN
            .iter()
            .find(|category| category.suffix() == suffix)
            .cloned()
            .unwrap_or_else(|| Self::Transform(suffix.to_string()))
    }

    pub fn default_severity(&self) -> IssueSeverity {
        match self {
            Self::CleanedCases | Self::FieldAdded | Self::UnknownColumns | Self::Transform(_) => {
                IssueSeverity::Info
            }
            Self::MissingColumns | Self::Duplicates | Self::SpecialCharIssues => {
                IssueSeverity::Warning
            }
            _ => IssueSeverity::Error,
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl Serialize for IssueCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.suffix())
    }
}

/// `"{prefix}_{suffix}"`.
pub fn category_name(prefix: &str, category: &IssueCategory) -> String {
    format!("{prefix}_{}", category.suffix())
}

/// A single data defect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub category: IssueCategory,
    /// Index in the input frame; `None` for column-level issues (serialized as -1).
    #[serde(serialize_with = "serialize_row_index")]
    pub row_index: Option<usize>,
    /// Column name, with an `[i]` suffix for array elements.
    pub column: String,
    pub observed: Value,
    pub expected: String,
    pub severity: IssueSeverity,
    /// Earlier rows involved in the same defect (uniqueness, duplicates).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_rows: Vec<usize>,
}

impl Issue {
    pub fn new(category: IssueCategory, column: impl Into<String>) -> Self {
        let severity = category.default_severity();
        Self {
            category,
            row_index: None,
            column: column.into(),
            observed: Value::Null,
            expected: String::new(),
            severity,
            related_rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row_index: usize) -> Self {
        self.row_index = Some(row_index);
        self
    }

    pub fn with_observed(mut self, observed: Value) -> Self {
        self.observed = observed;
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = expected.into();
        self
    }

    pub fn with_severity(mut self, severity: IssueSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_related_row(mut self, row_index: usize) -> Self {
        self.related_rows.push(row_index);
        self
    }

    /// Row index as reported to consumers, -1 for column-level issues.
    pub fn reported_row(&self) -> i64 {
        self.row_index
            .and_then(|idx| i64::try_from(idx).ok())
            .unwrap_or(-1)
    }
}

fn serialize_row_index<S: Serializer>(
    row: &Option<usize>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match row {
        Some(idx) => serializer.serialize_u64(*idx as u64),
        None => serializer.serialize_i64(-1),
    }
}
