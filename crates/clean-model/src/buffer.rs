//! Issue accumulation and the frozen report handed to consumers.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::issue::{Issue, IssueCategory, IssueSeverity, category_name};

/// Collects issues for one pipeline run, bucketed by category.
///
/// Append order is preserved inside each bucket. Buckets iterate in
/// [`IssueCategory`] declaration order, with transform buckets last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueBuffer {
    prefix: String,
    buckets: BTreeMap<IssueCategory, Vec<Issue>>,
}

impl IssueBuffer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            buckets: BTreeMap::new(),
        }
    }

    /// Skeleton buffer with every given category present and empty.
    pub fn with_categories<I>(prefix: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = IssueCategory>,
    {
        let mut buffer = Self::new(prefix);
        for category in categories {
            buffer.register(category);
        }
        buffer
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Make sure `category` appears in the report, even if it stays empty.
    pub fn register(&mut self, category: IssueCategory) {
        self.buckets.entry(category).or_default();
    }

    pub fn push(&mut self, issue: Issue) {
        self.buckets
            .entry(issue.category.clone())
            .or_default()
            .push(issue);
    }

    pub fn extend<I>(&mut self, issues: I)
    where
        I: IntoIterator<Item = Issue>,
    {
        for issue in issues {
            self.push(issue);
        }
    }

    pub fn issues(&self, category: &IssueCategory) -> &[Issue] {
        self.buckets.get(category).map_or(&[], Vec::as_slice)
    }

    /// Total number of issues across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    pub fn categories(&self) -> impl Iterator<Item = &IssueCategory> {
        self.buckets.keys()
    }

    /// End the run; the buffer can no longer be appended to.
    pub fn freeze(self) -> IssueReport {
        IssueReport {
            prefix: self.prefix,
            buckets: self.buckets,
        }
    }
}

/// Immutable, categorized defect report of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueReport {
    prefix: String,
    buckets: BTreeMap<IssueCategory, Vec<Issue>>,
}

impl IssueReport {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn category_name(&self, category: &IssueCategory) -> String {
        category_name(&self.prefix, category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &IssueCategory> {
        self.buckets.keys()
    }

    pub fn contains(&self, category: &IssueCategory) -> bool {
        self.buckets.contains_key(category)
    }

    pub fn issues(&self, category: &IssueCategory) -> &[Issue] {
        self.buckets.get(category).map_or(&[], Vec::as_slice)
    }

    /// Lookup by full prefixed name, e.g. `tra_null_issues`.
    pub fn get(&self, name: &str) -> Option<&[Issue]> {
        let suffix = name.strip_prefix(&self.prefix)?.strip_prefix('_')?;
        self.buckets
            .get(&IssueCategory::from_suffix(suffix))
            .map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.buckets.values().flatten()
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn count_by_severity(&self, severity: IssueSeverity) -> usize {
        self.iter().filter(|issue| issue.severity == severity).count()
    }

    pub fn error_count(&self) -> usize {
        self.count_by_severity(IssueSeverity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count_by_severity(IssueSeverity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// True when every bucket outside `allowed` is empty.
    pub fn is_clean_except(&self, allowed: &[IssueCategory]) -> bool {
        self.buckets
            .iter()
            .all(|(category, issues)| issues.is_empty() || allowed.contains(category))
    }

    /// Issue count per prefixed category name, in report order.
    pub fn summary(&self) -> Vec<(String, usize)> {
        self.buckets
            .iter()
            .map(|(category, issues)| (self.category_name(category), issues.len()))
            .collect()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for IssueReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (category, issues) in &self.buckets {
            map.serialize_entry(&self.category_name(category), issues)?;
        }
        map.end()
    }
}
