// src/dag/registry.rs

//! Pending units and their remaining dependency edges.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, trace};

use crate::dag::unit::{Unit, UnitDescriptor};
use crate::errors::LoadError;
use crate::types::UnitId;

/// Holds every unit that has not completed yet.
///
/// Units are keyed by id in a `BTreeMap`, so iteration (and therefore every
/// scan) is deterministic.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    pending: BTreeMap<UnitId, Unit>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a batch of descriptors.
    ///
    /// Every descriptor needs a non-empty id and resource, must not depend on
    /// itself, and must not reuse an id that is already pending or appears
    /// earlier in the same batch. The first offending descriptor rejects the
    /// whole batch and the registry is left untouched.
    pub fn register(
        &mut self,
        descriptors: impl IntoIterator<Item = UnitDescriptor>,
    ) -> Result<(), LoadError> {
        let mut staged: Vec<Unit> = Vec::new();
        let mut seen: HashSet<UnitId> = HashSet::new();

        for (index, desc) in descriptors.into_iter().enumerate() {
            if desc.id.trim().is_empty() {
                return Err(LoadError::Validation(format!(
                    "unit #{index} has no id"
                )));
            }
            if desc.resource.trim().is_empty() {
                return Err(LoadError::Validation(format!(
                    "unit '{}' has no resource locator",
                    desc.id
                )));
            }
            if desc.depends_on.iter().any(|dep| dep == &desc.id) {
                return Err(LoadError::Validation(format!(
                    "unit '{}' cannot depend on itself",
                    desc.id
                )));
            }
            if self.pending.contains_key(&desc.id) || !seen.insert(desc.id.clone()) {
                return Err(LoadError::Validation(format!(
                    "duplicate unit id '{}'",
                    desc.id
                )));
            }

            staged.push(Unit::from_descriptor(desc));
        }

        for unit in staged {
            debug!(
                unit = %unit.id,
                resource = %unit.resource,
                deps = ?unit.depends_on,
                "registered unit"
            );
            self.pending.insert(unit.id.clone(), unit);
        }

        Ok(())
    }

    /// Remove a completed unit and clear it from every other unit's
    /// dependency set.
    ///
    /// Returns `true` if at least one remaining unit's `depends_on` changed.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.pending.remove(id).is_none() {
            trace!(unit = %id, "remove called for a unit that is not pending");
        }

        let mut dependency_cleared = false;
        for unit in self.pending.values_mut() {
            if unit.depends_on.remove(id) {
                trace!(unit = %unit.id, cleared = %id, "dependency cleared");
                dependency_cleared = true;
            }
        }

        dependency_cleared
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Unit> {
        self.pending.get(id)
    }

    /// Pending units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.pending.values()
    }

    /// Pending ids in id order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.pending.keys().map(|s| s.as_str())
    }
}
