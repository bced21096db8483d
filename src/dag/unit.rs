// src/dag/unit.rs

//! Loadable units and the descriptors they are built from.

use std::collections::BTreeSet;

use crate::types::UnitId;

/// Supplier-facing description of one gated resource.
///
/// This is what a manifest (or any other supplier) hands to the registry.
/// Nothing here is validated yet; see [`TaskRegistry::register`].
///
/// [`TaskRegistry::register`]: crate::dag::TaskRegistry::register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescriptor {
    pub id: UnitId,
    pub resource: String,
    pub depends_on: Vec<UnitId>,
}

impl UnitDescriptor {
    pub fn new(id: impl Into<UnitId>, resource: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource: resource.into(),
            depends_on: Vec::new(),
        }
    }

    /// Add a dependency on `dep`.
    pub fn after(mut self, dep: impl Into<UnitId>) -> Self {
        self.depends_on.push(dep.into());
        self
    }
}

/// One registered unit.
///
/// `depends_on` shrinks as dependencies complete; a unit whose set is empty
/// and which is not in flight is eligible for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    /// Opaque locator handed to the fetch backend.
    pub resource: String,
    /// Ids this unit still waits for.
    pub depends_on: BTreeSet<UnitId>,
}

impl Unit {
    pub fn from_descriptor(desc: UnitDescriptor) -> Self {
        Self {
            id: desc.id,
            resource: desc.resource,
            depends_on: desc.depends_on.into_iter().collect(),
        }
    }

    pub fn is_unblocked(&self) -> bool {
        self.depends_on.is_empty()
    }
}
