//! Data model for the schema-driven cleaning pipeline.
//!
//! Holds the cell and frame types, per-entity rule sets, and the issue
//! buffer/report surface shared by the validation and pipeline crates.

pub mod buffer;
pub mod error;
pub mod frame;
pub mod issue;
pub mod options;
pub mod polars;
pub mod rule;
pub mod rule_set;
pub mod value;

pub use buffer::{IssueBuffer, IssueReport};
pub use error::{FrameError, PipelineError, RuleSpecError, UnknownColumn};
pub use frame::{Frame, Row, row};
pub use issue::{Issue, IssueCategory, IssueSeverity, category_name};
pub use options::PipelineOptions;
pub use rule::{CaseFold, CharClass, FieldRule, FieldType, Violation};
pub use rule_set::{KeyFn, KeyStrategy, RowKey, RuleSet, RuleSetBuilder};
pub use value::{Value, ValueKey};
