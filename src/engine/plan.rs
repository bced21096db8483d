// src/engine/plan.rs

//! Dry-run planning.
//!
//! Runs a real [`LoadCoordinator`] against a simulated backend in which every
//! dispatched unit finishes at once. Each dispatch batch becomes one round,
//! which is exactly the order a session would use if every fetch took the
//! same amount of time.

use std::fmt;

use crate::dag::UnitDescriptor;
use crate::engine::core::LoadCoordinator;
use crate::engine::{RuntimeEvent, SessionEvent};
use crate::errors::LoadError;
use crate::types::UnitId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DispatchPlan {
    /// Ids dispatched together, round by round.
    pub rounds: Vec<Vec<UnitId>>,
}

impl DispatchPlan {
    pub fn unit_count(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }
}

impl fmt::Display for DispatchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, round) in self.rounds.iter().enumerate() {
            writeln!(f, "  round {}: {}", i + 1, round.join(", "))?;
        }
        Ok(())
    }
}

/// Compute dispatch rounds for `descriptors`, or the error the session would
/// fail with (validation, cycle, missing dependency).
pub fn plan_rounds(
    descriptors: impl IntoIterator<Item = UnitDescriptor>,
) -> Result<DispatchPlan, LoadError> {
    let mut core = LoadCoordinator::new(descriptors)?;
    let mut plan = DispatchPlan::default();
    let mut step = core.start();

    loop {
        if let Some(SessionEvent::FatalError(err)) = step.terminal_event() {
            return Err(err.clone());
        }

        let batch = step.dispatched_ids();
        if batch.is_empty() {
            break;
        }

        for id in batch.iter() {
            core.handle(RuntimeEvent::UnitFinished { id: id.clone() });
        }
        plan.rounds.push(batch);
        step = core.flush();
    }

    match core.outcome() {
        Some(Ok(_)) => Ok(plan),
        Some(Err(err)) => Err(err.clone()),
        None => Err(LoadError::Protocol(
            "simulated session stopped without reaching a terminal state".to_string(),
        )),
    }
}
