//! Structural error types.
//!
//! Data defects never surface here; they are recorded as issues. These errors
//! cover malformed rule sets, malformed frames, and contract violations by
//! pre-transforms, all of which abort a run without a partial result.

use thiserror::Error;

use crate::rule::FieldType;

/// A rule set that cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RuleSpecError {
    #[error("invalid-rule-spec: entity prefix must not be empty")]
    EmptyPrefix,

    #[error("invalid-rule-spec: column '{column}' declared twice")]
    DuplicateColumn { column: String },

    #[error("invalid-rule-spec: no column is marked primary_key")]
    NoPrimaryKey,

    #[error("invalid-rule-spec: several primary keys declared ({})", columns.join(", "))]
    MultiplePrimaryKeys { columns: Vec<String> },

    #[error("invalid-rule-spec: array column '{column}' has no element_type")]
    MissingElementType { column: String },

    #[error("invalid-rule-spec: column '{column}' uses unsupported element_type {element_type}")]
    InvalidElementType {
        column: String,
        element_type: FieldType,
    },

    #[error("invalid-rule-spec: default for '{column}' does not satisfy its rule: {message}")]
    InvalidDefault { column: String, message: String },

    #[error("invalid-rule-spec: composite key names no columns")]
    EmptyKey,

    #[error("invalid-rule-spec: key column '{column}' is not declared")]
    UnknownKeyColumn { column: String },

    #[error("invalid-rule-spec: character class '{class}' is invalid: {message}")]
    InvalidCharClass { class: String, message: String },
}

/// Lookup of a column the rule set does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown-column: {0}")]
pub struct UnknownColumn(pub String);

/// A frame whose shape is not tabular.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameError {
    #[error("column '{column}' appears more than once")]
    DuplicateColumn { column: String },

    #[error("row {row} holds column '{column}' which the frame does not declare")]
    UnexpectedColumn { row: usize, column: String },

    #[error("column '{column}' does not exist")]
    UnknownColumn { column: String },

    #[error("row {row} is out of bounds")]
    RowOutOfBounds { row: usize },

    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

/// Failure of a whole pipeline run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    #[error(transparent)]
    InvalidRuleSpec(#[from] RuleSpecError),

    #[error("invalid-transform-output: pre-transform '{transform}' {message}")]
    InvalidTransformOutput { transform: String, message: String },

    #[error("invalid-input-shape: {0}")]
    InvalidInputShape(#[from] FrameError),

    #[error("pipeline run was cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Stable kebab-case code for the failure class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRuleSpec(_) => "invalid-rule-spec",
            Self::InvalidTransformOutput { .. } => "invalid-transform-output",
            Self::InvalidInputShape(_) => "invalid-input-shape",
            Self::Cancelled => "cancelled",
        }
    }
}
