//! The pre-transform contract.

use std::fmt;

use clean_model::{Frame, FrameError, Issue};

/// Result of one pre-transform: the rewritten frame plus what it changed.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub frame: Frame,
    pub issues: Vec<Issue>,
}

impl TransformOutput {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            issues: Vec::new(),
        }
    }

    pub fn with_issues(mut self, issues: Vec<Issue>) -> Self {
        self.issues = issues;
        self
    }
}

/// A caller-supplied frame rewrite run before validation.
///
/// Implementations read the input frame and return a new one. They may add
/// columns or fill values but must keep every row.
pub trait PreTransform: Send + Sync {
    /// Name used in logs and `invalid-transform-output` errors.
    fn name(&self) -> &str;

    fn apply(&self, frame: &Frame) -> Result<TransformOutput, FrameError>;
}

/// Adapter turning a closure into a [`PreTransform`].
pub struct FnTransform<F> {
    name: String,
    func: F,
}

impl<F> fmt::Debug for FnTransform<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform").field("name", &self.name).finish()
    }
}

impl<F> PreTransform for FnTransform<F>
where
    F: Fn(&Frame) -> Result<TransformOutput, FrameError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, frame: &Frame) -> Result<TransformOutput, FrameError> {
        (self.func)(frame)
    }
}

/// Wrap `func` as a named pre-transform.
pub fn from_fn<F>(name: impl Into<String>, func: F) -> FnTransform<F>
where
    F: Fn(&Frame) -> Result<TransformOutput, FrameError> + Send + Sync,
{
    FnTransform {
        name: name.into(),
        func,
    }
}
