// src/dag/eligibility.rs

use std::collections::BTreeSet;

use crate::dag::registry::TaskRegistry;
use crate::dag::unit::Unit;
use crate::types::UnitId;

/// Every pending unit with no remaining dependencies that is not already in
/// flight, in id order.
///
/// Always computed from the current registry state; callers must not cache
/// the result across completions.
pub fn find_eligible(registry: &TaskRegistry, in_flight: &BTreeSet<UnitId>) -> Vec<Unit> {
    registry
        .units()
        .filter(|unit| unit.is_unblocked() && !in_flight.contains(&unit.id))
        .cloned()
        .collect()
}
