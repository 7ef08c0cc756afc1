//! Immutable schema for one entity.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::buffer::IssueBuffer;
use crate::error::{RuleSpecError, UnknownColumn};
use crate::frame::Row;
use crate::issue::{IssueCategory, category_name};
use crate::rule::{FieldRule, FieldType};
use crate::value::{Value, ValueKey};

/// Identity of a row for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(Vec<ValueKey>);

impl RowKey {
    /// Build a key from its parts.
    ///
    /// Returns `None` when any part is null or an empty string: such rows have
    /// no identity and are exempt from duplicate detection.
    pub fn from_values<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut parts = Vec::new();
        for value in values {
            if value.as_str().is_some_and(|text| text.trim().is_empty()) {
                return None;
            }
            parts.push(value.key()?);
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self(parts))
    }

    pub fn parts(&self) -> &[ValueKey] {
        &self.0
    }
}

/// Caller-supplied key function.
pub type KeyFn = Arc<dyn Fn(&Row) -> Option<RowKey> + Send + Sync>;

/// How [`RuleSet::key_of`] derives a row's identity.
#[derive(Clone, Default)]
pub enum KeyStrategy {
    /// The value of the primary-key column.
    #[default]
    PrimaryKey,
    /// Composite of several declared columns, in the given order.
    Columns(Vec<String>),
    Custom(KeyFn),
}

impl fmt::Debug for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStrategy::PrimaryKey => write!(f, "PrimaryKey"),
            KeyStrategy::Columns(columns) => f.debug_tuple("Columns").field(columns).finish(),
            KeyStrategy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Declarative description of one entity's columns.
///
/// Built once per entity through [`RuleSetBuilder`] and never mutated.
#[derive(Debug, Clone)]
pub struct RuleSet {
    entity: String,
    prefix: String,
    fields: Vec<(String, FieldRule)>,
    positions: BTreeMap<String, usize>,
    primary_key: String,
    key: KeyStrategy,
}

impl RuleSet {
    pub fn builder(entity: impl Into<String>, prefix: impl Into<String>) -> RuleSetBuilder {
        RuleSetBuilder {
            entity: entity.into(),
            prefix: prefix.into(),
            fields: Vec::new(),
            key: KeyStrategy::default(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Short entity prefix used to name issue categories.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Declared column names, in declaration order.
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn get(&self, column: &str) -> Option<&FieldRule> {
        self.positions.get(column).map(|&idx| &self.fields[idx].1)
    }

    pub fn rule_for(&self, column: &str) -> Result<&FieldRule, UnknownColumn> {
        self.get(column)
            .ok_or_else(|| UnknownColumn(column.to_string()))
    }

    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn key_strategy(&self) -> &KeyStrategy {
        &self.key
    }

    /// Columns that make up the row key; empty for custom key functions.
    pub fn key_columns(&self) -> Vec<&str> {
        match &self.key {
            KeyStrategy::PrimaryKey => vec![self.primary_key.as_str()],
            KeyStrategy::Columns(columns) => columns.iter().map(String::as_str).collect(),
            KeyStrategy::Custom(_) => Vec::new(),
        }
    }

    /// Columns with `unique` (or `primary_key`) set, in declaration order.
    pub fn unique_columns(&self) -> Vec<&str> {
        self.fields()
            .filter(|(_, rule)| rule.is_unique())
            .map(|(name, _)| name)
            .collect()
    }

    /// Stable identity of `row`, `None` when the key is null or empty.
    pub fn key_of(&self, row: &Row) -> Option<RowKey> {
        match &self.key {
            KeyStrategy::Custom(key_fn) => key_fn(row),
            _ => RowKey::from_values(
                self.key_columns()
                    .into_iter()
                    .map(|column| row.get(column).unwrap_or(&Value::Null)),
            ),
        }
    }

    /// `"{prefix}_{suffix}"`, e.g. `tra_null_issues`.
    pub fn issue_category(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.prefix)
    }

    pub fn category_name(&self, category: &IssueCategory) -> String {
        category_name(&self.prefix, category)
    }

    /// Every category this entity's rules can produce.
    pub fn output_categories(&self) -> Vec<IssueCategory> {
        let mut categories = BTreeSet::from([
            IssueCategory::MissingColumns,
            IssueCategory::UnknownColumns,
            IssueCategory::NullIssues,
            IssueCategory::CleanedCases,
            IssueCategory::UniquenessViolations,
            IssueCategory::Duplicates,
            IssueCategory::MissingPrimaryKey,
        ]);
        for (_, rule) in self.fields() {
            categories.insert(rule.field_type.issue_category());
            if let Some(element) = rule.element_type {
                categories.insert(element.issue_category());
            }
            if rule.min_value.is_some() || rule.max_value.is_some() {
                categories.insert(IssueCategory::IntegerIssues);
            }
            if rule.max_length.is_some() {
                categories.insert(IssueCategory::LengthIssues);
            }
            if rule.allowed_chars.is_some() || rule.forbidden_chars.is_some() {
                categories.insert(IssueCategory::SpecialCharIssues);
            }
        }
        categories.into_iter().collect()
    }

    /// Empty issue buffer holding every category the entity can produce.
    pub fn initialize_output_info(&self) -> IssueBuffer {
        IssueBuffer::with_categories(self.prefix.clone(), self.output_categories())
    }
}

/// Builder validating a [`RuleSet`] at construction.
#[derive(Debug)]
pub struct RuleSetBuilder {
    entity: String,
    prefix: String,
    fields: Vec<(String, FieldRule)>,
    key: KeyStrategy,
}

impl RuleSetBuilder {
    pub fn field(mut self, column: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push((column.into(), rule));
        self
    }

    pub fn key_strategy(mut self, key: KeyStrategy) -> Self {
        self.key = key;
        self
    }

    /// Composite key over the given columns.
    pub fn key_columns<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_strategy(KeyStrategy::Columns(
            columns.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn key_fn<F>(self, key_fn: F) -> Self
    where
        F: Fn(&Row) -> Option<RowKey> + Send + Sync + 'static,
    {
        self.key_strategy(KeyStrategy::Custom(Arc::new(key_fn)))
    }

    pub fn build(self) -> Result<RuleSet, RuleSpecError> {
        if self.prefix.trim().is_empty() {
            return Err(RuleSpecError::EmptyPrefix);
        }

        let mut positions = BTreeMap::new();
        for (idx, (column, _)) in self.fields.iter().enumerate() {
            if positions.insert(column.clone(), idx).is_some() {
                return Err(RuleSpecError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }

        let primary_keys: Vec<&String> = self
            .fields
            .iter()
            .filter(|(_, rule)| rule.primary_key)
            .map(|(column, _)| column)
            .collect();
        let primary_key = match primary_keys.as_slice() {
            [] => return Err(RuleSpecError::NoPrimaryKey),
            [single] => (*single).clone(),
            many => {
                return Err(RuleSpecError::MultiplePrimaryKeys {
                    columns: many.iter().map(|column| (*column).clone()).collect(),
                });
            }
        };

        for (column, rule) in &self.fields {
            validate_field(column, rule)?;
        }

        if let KeyStrategy::Columns(columns) = &self.key {
            if columns.is_empty() {
                return Err(RuleSpecError::EmptyKey);
            }
            if let Some(unknown) = columns.iter().find(|column| !positions.contains_key(*column)) {
                return Err(RuleSpecError::UnknownKeyColumn {
                    column: unknown.clone(),
                });
            }
        }

        Ok(RuleSet {
            entity: self.entity,
            prefix: self.prefix,
            fields: self.fields,
            positions,
            primary_key,
            key: self.key,
        })
    }
}

fn validate_field(column: &str, rule: &FieldRule) -> Result<(), RuleSpecError> {
    if rule.field_type == FieldType::Array {
        match rule.element_type {
            None => {
                return Err(RuleSpecError::MissingElementType {
                    column: column.to_string(),
                });
            }
            Some(FieldType::Array) => {
                return Err(RuleSpecError::InvalidElementType {
                    column: column.to_string(),
                    element_type: FieldType::Array,
                });
            }
            Some(_) => {}
        }
    }
    if let Some(default) = &rule.default
        && !default.is_null()
    {
        rule.conforms(default)
            .map_err(|violation| RuleSpecError::InvalidDefault {
                column: column.to_string(),
                message: format!(
                    "{} is not {} ({})",
                    default, violation.expected, violation.category
                ),
            })?;
    }
    Ok(())
}
