//! Pre-transforms applied to raw frames before validation.
//!
//! - **step**: the [`PreTransform`] contract and the closure adapter
//! - **fill**: constant-fill transforms ([`AddMissingFields`], [`FillNulls`])

pub mod fill;
pub mod step;

pub use fill::{AddMissingFields, FillNulls};
pub use step::{FnTransform, PreTransform, TransformOutput, from_fn};
