//! Declarative per-column rules.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RuleSpecError;
use crate::issue::IssueCategory;
use crate::value::Value;

/// Canonical target type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    String,
    Array,
    Boolean,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::String => "string",
            FieldType::Array => "array",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
        }
    }

    /// Bucket for values that cannot be read as this type.
    pub fn issue_category(&self) -> IssueCategory {
        match self {
            FieldType::Integer => IssueCategory::IntegerIssues,
            FieldType::String => IssueCategory::StringIssues,
            FieldType::Array => IssueCategory::ArrayIssues,
            FieldType::Boolean => IssueCategory::BooleanIssues,
            FieldType::Date => IssueCategory::DateIssues,
        }
    }

    /// Whether `value` already has this type's canonical representation.
    pub fn is_canonical(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::Integer, Value::Integer(_))
                | (FieldType::String, Value::Text(_))
                | (FieldType::Array, Value::Array(_))
                | (FieldType::Boolean, Value::Bool(_))
                | (FieldType::Date, Value::Date(_))
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case folding applied to string cells after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseFold {
    Upper,
    Lower,
}

impl CaseFold {
    pub fn apply(&self, text: &str) -> String {
        match self {
            CaseFold::Upper => text.to_uppercase(),
            CaseFold::Lower => text.to_lowercase(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseFold::Upper => "upper",
            CaseFold::Lower => "lower",
        }
    }
}

/// A character class written as the body of a regex bracket expression,
/// e.g. `A-Za-z0-9 '-`.
///
/// The body is always a positive set: a leading `^` and bare brackets are
/// matched literally.
#[derive(Debug, Clone)]
pub struct CharClass {
    class: String,
    regex: Regex,
}

impl CharClass {
    pub fn new(class: impl Into<String>) -> Result<Self, RuleSpecError> {
        let class = class.into();
        let regex = Regex::new(&format!("^[{}]$", bracket_body(&class))).map_err(|err| {
            RuleSpecError::InvalidCharClass {
                class: class.clone(),
                message: err.to_string(),
            }
        })?;
        Ok(Self { class, regex })
    }

    pub fn contains(&self, ch: char) -> bool {
        let mut buf = [0u8; 4];
        self.regex.is_match(ch.encode_utf8(&mut buf))
    }

    pub fn as_str(&self) -> &str {
        &self.class
    }
}

/// Escape a leading `^` and unescaped `[`/`]` so the body cannot negate or
/// close the bracket expression.
fn bracket_body(class: &str) -> String {
    let mut body = String::with_capacity(class.len() + 2);
    let mut escaped = false;
    for (index, ch) in class.chars().enumerate() {
        if escaped {
            body.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '^' if index == 0 => body.push('\\'),
            '[' | ']' => body.push('\\'),
            _ => {}
        }
        body.push(ch);
    }
    body
}

impl PartialEq for CharClass {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class
    }
}

/// A failed constraint on an already-typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub category: IssueCategory,
    pub expected: String,
}

impl Violation {
    pub fn new(category: IssueCategory, expected: impl Into<String>) -> Self {
        Self {
            category,
            expected: expected.into(),
        }
    }
}

/// Declarative description of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<Value>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub max_length: Option<usize>,
    pub unique: bool,
    pub primary_key: bool,
    pub element_type: Option<FieldType>,
    pub allowed_chars: Option<CharClass>,
    pub forbidden_chars: Option<CharClass>,
    pub case: Option<CaseFold>,
}

impl FieldRule {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            default: None,
            min_value: None,
            max_value: None,
            max_length: None,
            unique: false,
            primary_key: false,
            element_type: None,
            allowed_chars: None,
            forbidden_chars: None,
            case: None,
        }
    }

    pub fn integer() -> Self {
        Self::new(FieldType::Integer)
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn date() -> Self {
        Self::new(FieldType::Date)
    }

    pub fn array(element_type: FieldType) -> Self {
        Self::new(FieldType::Array).element_type(element_type)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn min_value(mut self, min: i64) -> Self {
        self.min_value = Some(min);
        self
    }

    pub fn max_value(mut self, max: i64) -> Self {
        self.max_value = Some(max);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the row-identity column; implies `unique` and `required`.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.unique = true;
        self.required = true;
        self
    }

    pub fn element_type(mut self, element_type: FieldType) -> Self {
        self.element_type = Some(element_type);
        self
    }

    pub fn allowed_chars(mut self, class: CharClass) -> Self {
        self.allowed_chars = Some(class);
        self
    }

    pub fn forbidden_chars(mut self, class: CharClass) -> Self {
        self.forbidden_chars = Some(class);
        self
    }

    pub fn case(mut self, case: CaseFold) -> Self {
        self.case = Some(case);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required || self.primary_key
    }

    pub fn is_unique(&self) -> bool {
        self.unique || self.primary_key
    }

    /// The substitution value, null when no default is declared.
    pub fn default_value(&self) -> Value {
        self.default.clone().unwrap_or(Value::Null)
    }

    /// Whether `value` is a placeholder: null or the declared default.
    pub fn is_placeholder(&self, value: &Value) -> bool {
        value.is_null() || self.default.as_ref().is_some_and(|default| default == value)
    }

    /// Rule applied to each element of an array column.
    pub fn element_rule(&self) -> Option<FieldRule> {
        self.element_type
            .map(|element_type| FieldRule::new(element_type).required())
    }

    /// Human-readable description of the accepted type.
    pub fn type_description(&self) -> String {
        match (self.field_type, self.element_type) {
            (FieldType::Array, Some(element)) => format!("array of {element}"),
            (FieldType::Date, _) => "date (YYYY-MM-DD)".to_string(),
            (field_type, _) => field_type.to_string(),
        }
    }

    /// Range, length, and character-class checks on a value of the right type.
    ///
    /// Array elements are not visited here.
    pub fn check_constraints(&self, value: &Value) -> Result<(), Violation> {
        match value {
            Value::Integer(number) => self.check_range(*number),
            Value::Text(text) => {
                self.check_length(text)?;
                self.check_chars(text)
            }
            _ => Ok(()),
        }
    }

    fn check_range(&self, number: i64) -> Result<(), Violation> {
        let below = self.min_value.is_some_and(|min| number < min);
        let above = self.max_value.is_some_and(|max| number > max);
        if !below && !above {
            return Ok(());
        }
        let expected = match (self.min_value, self.max_value) {
            (Some(min), Some(max)) => format!("integer between {min} and {max}"),
            (Some(min), None) => format!("integer >= {min}"),
            (None, Some(max)) => format!("integer <= {max}"),
            (None, None) => "integer".to_string(),
        };
        Err(Violation::new(IssueCategory::IntegerIssues, expected))
    }

    fn check_length(&self, text: &str) -> Result<(), Violation> {
        match self.max_length {
            Some(max) if text.chars().count() > max => Err(Violation::new(
                IssueCategory::LengthIssues,
                format!("at most {max} characters"),
            )),
            _ => Ok(()),
        }
    }

    fn check_chars(&self, text: &str) -> Result<(), Violation> {
        if let Some(forbidden) = &self.forbidden_chars
            && text.chars().any(|ch| forbidden.contains(ch))
        {
            return Err(Violation::new(
                IssueCategory::SpecialCharIssues,
                format!("no characters from [{}]", forbidden.as_str()),
            ));
        }
        if let Some(allowed) = &self.allowed_chars
            && !text.chars().all(|ch| allowed.contains(ch))
        {
            return Err(Violation::new(
                IssueCategory::SpecialCharIssues,
                format!("only characters from [{}]", allowed.as_str()),
            ));
        }
        Ok(())
    }

    /// Strict conformance: `value` must already be canonical and pass every
    /// constraint, recursively for array elements. Used to vet defaults.
    pub fn conforms(&self, value: &Value) -> Result<(), Violation> {
        if value.is_null() {
            if self.is_required() {
                return Err(Violation::new(
                    IssueCategory::NullIssues,
                    format!("non-null {}", self.type_description()),
                ));
            }
            return Ok(());
        }
        if !self.field_type.is_canonical(value) {
            return Err(Violation::new(
                self.field_type.issue_category(),
                self.type_description(),
            ));
        }
        if let Value::Text(text) = value {
            let trimmed = text.trim();
            let folded = self.case.map(|case| case.apply(trimmed));
            if trimmed != text || folded.as_deref().is_some_and(|f| f != trimmed) {
                return Err(Violation::new(
                    IssueCategory::CleanedCases,
                    "trimmed, case-folded string",
                ));
            }
        }
        self.check_constraints(value)?;
        if let (Value::Array(items), Some(element)) = (value, self.element_rule()) {
            for item in items {
                element.conforms(item)?;
            }
        }
        Ok(())
    }
}
