// src/dag/diagnose.rs

//! Explain why a session stalled.
//!
//! When no unit is eligible and nothing is in flight, every remaining unit is
//! waiting either on an id that was never registered or on a cycle. The
//! coordinator only needs to know *that* it is stuck; this module works out
//! *why*, so the error message points at the offending units.

use std::collections::BTreeSet;
use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

use crate::dag::registry::TaskRegistry;
use crate::types::UnitId;

/// A unit waiting on an id that is not (and never was) pending.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MissingDependency {
    pub unit: UnitId,
    pub dependency: UnitId,
}

/// Diagnostic snapshot of a registry that can no longer make progress.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StallReport {
    /// Every unit still pending, in id order.
    pub remaining: Vec<UnitId>,
    /// Dependencies naming ids that are not registered.
    pub missing: Vec<MissingDependency>,
    /// Groups of units that wait on each other (each sorted by id).
    pub cycles: Vec<Vec<UnitId>>,
    /// Units that are neither in a cycle nor missing a dependency themselves,
    /// but wait on one that is.
    pub blocked: Vec<UnitId>,
}

impl StallReport {
    /// Build a report from the registry's current state.
    ///
    /// Completed units are removed from every `depends_on` as they finish, so
    /// any dependency that is not pending here was never registered.
    pub fn from_registry(registry: &TaskRegistry) -> Self {
        let remaining: Vec<UnitId> = registry.ids().map(str::to_string).collect();

        let mut missing = Vec::new();
        // Edge direction: dependency -> dependent.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for unit in registry.units() {
            graph.add_node(unit.id.as_str());
        }

        for unit in registry.units() {
            for dep in unit.depends_on.iter() {
                if registry.contains(dep) {
                    graph.add_edge(dep.as_str(), unit.id.as_str(), ());
                } else {
                    missing.push(MissingDependency {
                        unit: unit.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        let mut cycles: Vec<Vec<UnitId>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut ids: Vec<UnitId> = component.into_iter().map(str::to_string).collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        missing.sort();

        let mut explained: BTreeSet<&str> = BTreeSet::new();
        for cycle in cycles.iter() {
            explained.extend(cycle.iter().map(|s| s.as_str()));
        }
        for m in missing.iter() {
            explained.insert(m.unit.as_str());
        }

        let blocked = remaining
            .iter()
            .filter(|id| !explained.contains(id.as_str()))
            .cloned()
            .collect();

        Self {
            remaining,
            missing,
            cycles,
            blocked,
        }
    }

    pub fn has_cycle(&self) -> bool {
        !self.cycles.is_empty()
    }

    pub fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }
}

impl fmt::Display for StallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "there is either a circular dependency or a missing dependency ({} unit(s) remaining)",
            self.remaining.len()
        )?;

        for m in self.missing.iter() {
            write!(
                f,
                "; unit '{}' depends on unregistered '{}'",
                m.unit, m.dependency
            )?;
        }
        for cycle in self.cycles.iter() {
            write!(f, "; cycle between [{}]", cycle.join(", "))?;
        }
        if !self.blocked.is_empty() {
            write!(f, "; blocked: [{}]", self.blocked.join(", "))?;
        }

        Ok(())
    }
}
