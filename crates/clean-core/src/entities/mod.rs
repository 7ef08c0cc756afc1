//! Built-in entity catalog.

pub mod companies;
pub mod transport;

use crate::entity::EntityDescriptor;

/// Every built-in entity.
pub fn catalog() -> Vec<EntityDescriptor> {
    vec![transport::descriptor(), companies::descriptor()]
}

/// Look up a built-in entity by name (case-insensitive).
pub fn descriptor(name: &str) -> Option<EntityDescriptor> {
    catalog()
        .into_iter()
        .find(|entity| entity.name.eq_ignore_ascii_case(name.trim()))
}
