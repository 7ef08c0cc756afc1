//! Schema-driven row validation and issue reporting.
//!
//! - **pipeline**: the [`Pipeline`] run (pre-transforms, column reconciliation,
//!   normalization, uniqueness)
//! - **entity**: [`EntityDescriptor`], the per-entity function table
//! - **entities**: built-in transport and companies descriptors
//! - **logging**: subscriber setup for hosts

pub mod entities;
pub mod entity;
pub mod logging;
pub mod pipeline;

pub use entities::{catalog, descriptor};
pub use entity::EntityDescriptor;
pub use pipeline::{CancellationFlag, Pipeline, PipelineOutput};

// Re-export the model so hosts need a single dependency.
pub use clean_model::{
    Frame, Issue, IssueBuffer, IssueCategory, IssueReport, IssueSeverity, PipelineError,
    PipelineOptions, Row, RuleSet, Value, row,
};
