//! Configuration options for a cleaning run.

use serde::{Deserialize, Serialize};

use crate::issue::{IssueCategory, IssueSeverity};

/// Options controlling pipeline behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Category suffix under which pre-transform issues are filed.
    /// Default: `field_added`.
    pub transform_category: String,

    /// Severity given to pre-transform issues. Default: info.
    pub transform_severity: IssueSeverity,

    /// Strip surrounding whitespace from string cells. Default: true.
    pub trim_strings: bool,

    /// Record input columns absent from the rule set as `unknown_columns`
    /// before dropping them. Default: true.
    pub record_unknown_columns: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            transform_category: IssueCategory::FieldAdded.suffix().to_string(),
            transform_severity: IssueSeverity::Info,
            trim_strings: true,
            record_unknown_columns: true,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON; absent keys keep their defaults.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn with_transform_category(mut self, suffix: impl Into<String>) -> Self {
        self.transform_category = suffix.into();
        self
    }

    pub fn with_transform_severity(mut self, severity: IssueSeverity) -> Self {
        self.transform_severity = severity;
        self
    }

    pub fn with_trim_strings(mut self, enable: bool) -> Self {
        self.trim_strings = enable;
        self
    }

    pub fn with_unknown_columns_recorded(mut self, enable: bool) -> Self {
        self.record_unknown_columns = enable;
        self
    }

    /// Resolved bucket for pre-transform issues.
    pub fn transform_bucket(&self) -> IssueCategory {
        IssueCategory::from_suffix(&self.transform_category)
    }
}
