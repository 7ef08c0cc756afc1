//! Cell values carried by frames.
//!
//! Upstream sources mix scalar kinds freely inside one column, so a cell is a
//! small tagged union rather than a typed column buffer. Validation decides
//! which kind a column is allowed to hold.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single cell in a [`Frame`](crate::Frame).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Hashable fingerprint of the value, `None` for nulls.
    ///
    /// Two values share a key only when they have the same kind and the same
    /// content, so `Integer(1)` and `Text("1")` never collide.
    pub fn key(&self) -> Option<ValueKey> {
        if self.is_null() {
            return None;
        }
        let mut out = String::new();
        write_fingerprint(self, &mut out);
        Some(ValueKey(out))
    }
}

fn write_fingerprint(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push('n'),
        Value::Bool(flag) => out.push_str(if *flag { "b:true" } else { "b:false" }),
        Value::Integer(number) => out.push_str(&format!("i:{number}")),
        Value::Float(number) => out.push_str(&format!("f:{number:?}")),
        Value::Text(text) => out.push_str(&format!("s:{text:?}")),
        Value::Date(date) => out.push_str(&format!("d:{date}")),
        Value::Array(items) => {
            out.push_str("a:[");
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_fingerprint(item, out);
            }
            out.push(']');
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Integer(number) => write!(f, "{number}"),
            Value::Float(number) => write!(f, "{number}"),
            Value::Text(text) => write!(f, "{text:?}"),
            Value::Date(date) => write!(f, "{date}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Identity of a non-null value inside the uniqueness indexes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueKey(String);

impl ValueKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_has_no_key() {
        assert_eq!(Value::Null.key(), None);
    }

    #[test]
    fn keys_distinguish_kinds() {
        let int = Value::Integer(1).key();
        let text = Value::from("1").key();
        assert!(int.is_some());
        assert_ne!(int, text);
    }

    #[test]
    fn array_keys_are_unambiguous() {
        let split = Value::from(vec!["a,b"]).key();
        let pair = Value::from(vec!["a", "b"]).key();
        assert_ne!(split, pair);
        assert_eq!(Value::from(vec![1, 2]).key(), Value::from(vec![1, 2]).key());
    }

    #[test]
    fn untagged_json_round_trip() {
        let value: Value = serde_json::from_str(r#"[1, "x", null, true, 2.5]"#).unwrap();
        assert_eq!(
            value,
            Value::Array(vec![
                Value::Integer(1),
                Value::from("x"),
                Value::Null,
                Value::Bool(true),
                Value::Float(2.5),
            ])
        );
    }

    #[test]
    fn display_quotes_text() {
        let value = Value::from(vec![Value::from("a"), Value::Integer(2)]);
        assert_eq!(value.to_string(), "[\"a\", 2]");
    }
}
