//! Table-level duplicate detection over normalized rows.
//!
//! Two indexes are kept. The row-key index maps `key_of(row)` to the first
//! row that introduced it; later rows with the same key are dropped. The
//! per-column index maps each unique column's values to their first row;
//! later collisions are reported and the later cell is replaced by the
//! column default, so the cleaned frame never repeats a unique value.
//! Placeholders (null or the column default) are exempt from both checks.

use std::collections::HashMap;

use clean_model::{Issue, IssueBuffer, IssueCategory, KeyFn, RowKey, RuleSet, Value, ValueKey};
use tracing::debug;

use crate::row::NormalizedRow;

/// Single-pass index built while rows are admitted in input order.
pub struct UniquenessIndex<'a> {
    rules: &'a RuleSet,
    key_fn: Option<KeyFn>,
    keys: HashMap<RowKey, usize>,
    columns: Vec<(&'a str, HashMap<ValueKey, usize>)>,
}

impl<'a> UniquenessIndex<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        let columns = rules
            .unique_columns()
            .into_iter()
            .map(|column| (column, HashMap::new()))
            .collect();
        Self {
            rules,
            key_fn: None,
            keys: HashMap::new(),
            columns,
        }
    }

    /// Replace the rule set's key strategy for this run.
    pub fn with_key_fn(mut self, key_fn: KeyFn) -> Self {
        self.key_fn = Some(key_fn);
        self
    }

    fn key_of(&self, row: &NormalizedRow) -> Option<RowKey> {
        match &self.key_fn {
            Some(key_fn) => key_fn(&row.values),
            None => self.rules.key_of(&row.values),
        }
    }

    /// Number of distinct row keys seen so far.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Check `row` against every earlier admitted row.
    ///
    /// Returns `false` when the row must be dropped: its key was already
    /// seen, or it repeats an earlier primary-key value. Otherwise colliding
    /// unique cells are reset to their default in place and the row is kept.
    pub fn admit(&mut self, row: &mut NormalizedRow, issues: &mut IssueBuffer) -> bool {
        let key = self.key_of(row);
        if let Some(key) = &key
            && let Some(&first) = self.keys.get(key)
        {
            issues.push(
                Issue::new(IssueCategory::Duplicates, self.key_label())
                    .with_row(row.index)
                    .with_observed(self.key_value(row))
                    .with_expected("unique row key")
                    .with_related_row(first),
            );
            debug!(row = row.index, first, "duplicate row key, row dropped");
            return false;
        }

        let mut pending: Vec<(&'a str, ValueKey)> = Vec::new();
        let mut reset: Vec<&'a str> = Vec::new();
        for (column, seen) in &self.columns {
            let column = *column;
            let Ok(rule) = self.rules.rule_for(column) else {
                continue;
            };
            let value = row.get(column);
            if rule.is_placeholder(value) {
                continue;
            }
            let Some(value_key) = value.key() else {
                continue;
            };
            match seen.get(&value_key) {
                Some(&first) => {
                    issues.push(
                        Issue::new(IssueCategory::UniquenessViolations, column)
                            .with_row(row.index)
                            .with_observed(value.clone())
                            .with_expected("unique value")
                            .with_related_row(first),
                    );
                    if rule.primary_key {
                        debug!(row = row.index, first, column, "repeated primary key, row dropped");
                        return false;
                    }
                    reset.push(column);
                }
                None => pending.push((column, value_key)),
            }
        }

        for column in reset {
            if let Ok(rule) = self.rules.rule_for(column) {
                row.values.insert(column.to_string(), rule.default_value());
            }
        }
        for (column, value_key) in pending {
            if let Some((_, seen)) = self.columns.iter_mut().find(|(name, _)| *name == column) {
                seen.insert(value_key, row.index);
            }
        }
        if let Some(key) = key {
            self.keys.insert(key, row.index);
        }
        true
    }

    /// Columns named in duplicate issues; custom keys report the primary key.
    fn reported_key_columns(&self) -> Vec<&'a str> {
        let columns = self.rules.key_columns();
        if self.key_fn.is_some() || columns.is_empty() {
            return vec![self.rules.primary_key()];
        }
        columns
    }

    fn key_label(&self) -> String {
        self.reported_key_columns().join("+")
    }

    fn key_value(&self, row: &NormalizedRow) -> Value {
        match self.reported_key_columns().as_slice() {
            [single] => row.get(single).clone(),
            many => Value::Array(many.iter().map(|column| row.get(column).clone()).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clean_model::{FieldRule, Row, row};

    use super::*;

    fn rules() -> RuleSet {
        RuleSet::builder("transport", "tra")
            .field("tra_id", FieldRule::integer().primary_key())
            .field(
                "tra_denomination",
                FieldRule::string().required().unique().with_default(""),
            )
            .build()
            .unwrap()
    }

    fn normalized(index: usize, id: i64, name: &str) -> NormalizedRow {
        NormalizedRow {
            index,
            values: row([("tra_id", Value::from(id)), ("tra_denomination", Value::from(name))]),
        }
    }

    #[test]
    fn duplicate_key_keeps_first() {
        let rules = rules();
        let mut issues = rules.initialize_output_info();
        let mut index = UniquenessIndex::new(&rules);
        assert!(index.admit(&mut normalized(0, 1, "ACME"), &mut issues));
        assert!(!index.admit(&mut normalized(1, 1, "Blue"), &mut issues));
        assert!(index.admit(&mut normalized(2, 2, "Blue"), &mut issues));

        let duplicates = issues.issues(&IssueCategory::Duplicates);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].row_index, Some(1));
        assert_eq!(duplicates[0].related_rows, vec![0]);
        assert_eq!(duplicates[0].column, "tra_id");
        assert_eq!(duplicates[0].observed, Value::Integer(1));
        // The dropped row did not claim "Blue".
        assert!(issues.issues(&IssueCategory::UniquenessViolations).is_empty());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn unique_column_collision_resets_later_cell() {
        let rules = rules();
        let mut issues = rules.initialize_output_info();
        let mut index = UniquenessIndex::new(&rules);
        let mut first = normalized(0, 1, "ACME");
        let mut second = normalized(1, 2, "ACME");
        assert!(index.admit(&mut first, &mut issues));
        assert!(index.admit(&mut second, &mut issues));

        assert_eq!(first.get("tra_denomination"), &Value::from("ACME"));
        assert_eq!(second.get("tra_denomination"), &Value::from(""));
        let violations = issues.issues(&IssueCategory::UniquenessViolations);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].row_index, Some(1));
        assert_eq!(violations[0].related_rows, vec![0]);
    }

    #[test]
    fn placeholders_are_exempt() {
        let rules = rules();
        let mut issues = rules.initialize_output_info();
        let mut index = UniquenessIndex::new(&rules);
        assert!(index.admit(&mut normalized(0, 1, ""), &mut issues));
        assert!(index.admit(&mut normalized(1, 2, ""), &mut issues));
        assert!(issues.is_empty());
    }

    #[test]
    fn null_keys_are_exempt_from_duplicate_detection() {
        let rules = RuleSet::builder("x", "x")
            .field("id", FieldRule::integer().primary_key())
            .field("code", FieldRule::string())
            .key_columns(["code"])
            .build()
            .unwrap();
        let mut issues = rules.initialize_output_info();
        let mut index = UniquenessIndex::new(&rules);
        for idx in 0..3 {
            let mut candidate = NormalizedRow {
                index: idx,
                values: row([("id", Value::from(idx as i64)), ("code", Value::Null)]),
            };
            assert!(index.admit(&mut candidate, &mut issues));
        }
        assert!(issues.is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn repeated_primary_key_under_composite_key_drops_row() {
        let rules = RuleSet::builder("x", "x")
            .field("id", FieldRule::integer().primary_key())
            .field("code", FieldRule::string())
            .key_columns(["id", "code"])
            .build()
            .unwrap();
        let mut issues = rules.initialize_output_info();
        let mut index = UniquenessIndex::new(&rules);
        let mut a = NormalizedRow {
            index: 0,
            values: row([("id", Value::from(1)), ("code", Value::from("a"))]),
        };
        let mut b = NormalizedRow {
            index: 1,
            values: row([("id", Value::from(1)), ("code", Value::from("b"))]),
        };
        assert!(index.admit(&mut a, &mut issues));
        assert!(!index.admit(&mut b, &mut issues));
        assert_eq!(issues.issues(&IssueCategory::UniquenessViolations).len(), 1);
        assert!(issues.issues(&IssueCategory::Duplicates).is_empty());
    }

    #[test]
    fn key_fn_overrides_rule_set_key() {
        let rules = rules();
        let mut issues = rules.initialize_output_info();
        let key_fn: KeyFn = Arc::new(|row: &Row| {
            let name = row.get("tra_denomination")?.as_str()?.to_lowercase();
            RowKey::from_values([&Value::Text(name)])
        });
        let mut index = UniquenessIndex::new(&rules).with_key_fn(key_fn);
        assert!(index.admit(&mut normalized(0, 1, "acme"), &mut issues));
        assert!(!index.admit(&mut normalized(1, 2, "ACME"), &mut issues));
        let duplicates = issues.issues(&IssueCategory::Duplicates);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].column, "tra_id");
        assert_eq!(duplicates[0].observed, Value::Integer(2));
    }
}
