//! Entity descriptors.
//!
//! Every entity is a value of [`EntityDescriptor`]: a name plus the function
//! fields the pipeline needs to build its rule set, seed its issue report,
//! identify rows, and prepare raw frames.

use std::fmt;

use clean_model::{IssueBuffer, Row, RowKey, RuleSet, RuleSpecError};
use clean_transform::PreTransform;

#[derive(Clone, Copy)]
pub struct EntityDescriptor {
    pub name: &'static str,
    pub prefix: &'static str,
    /// Declarative rule table for the entity.
    pub field_rules: fn() -> Result<RuleSet, RuleSpecError>,
    /// Empty report skeleton listing every category the entity can produce.
    pub initialize_output_info: fn(&RuleSet) -> IssueBuffer,
    /// Row identity used for duplicate detection.
    pub key_of: fn(&Row) -> Option<RowKey>,
    /// Transforms run on raw frames before validation.
    pub pre_transforms: fn() -> Vec<Box<dyn PreTransform>>,
}

impl EntityDescriptor {
    /// Build and validate the entity's rule set.
    pub fn rule_set(&self) -> Result<RuleSet, RuleSpecError> {
        (self.field_rules)()
    }
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Pre-transform list for entities that need none.
pub fn no_pre_transforms() -> Vec<Box<dyn PreTransform>> {
    Vec::new()
}
