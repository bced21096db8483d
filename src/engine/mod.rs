// src/engine/mod.rs

//! Orchestration engine for a load session.
//!
//! This module ties together:
//! - the dependency registry and eligibility scan (from [`crate::dag`])
//! - the completion protocol ([`dispatcher`])
//! - the pure coordinator state machine ([`core`])
//! - the async actor loop that feeds it notifications ([`runtime`])
//!
//! The core is synchronous and deterministic; the runtime owns the channels
//! and the fetch backend.

use crate::errors::LoadError;
use crate::types::{SessionStats, UnitId};

/// Notifications flowing into the coordinator from fetch backends and
/// session handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A dispatched unit was retrieved successfully.
    UnitFinished { id: UnitId },
    /// A dispatched unit could not be retrieved.
    UnitFailed { id: UnitId, reason: String },
    /// Stop dispatching and fail with `Cancelled` once in-flight work drains.
    CancelRequested,
}

/// Events emitted by the coordinator to session observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The unit was marked in flight and handed to the fetch backend.
    Started { id: UnitId },
    /// The unit's completion was accepted.
    Finished { id: UnitId },
    /// Every unit finished. Emitted at most once, never together with
    /// `FatalError`.
    AllDone(SessionStats),
    /// The session failed. Emitted at most once, never together with
    /// `AllDone`.
    FatalError(LoadError),
}

impl SessionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::AllDone(_) | SessionEvent::FatalError(_))
    }
}

pub mod core;
pub mod dispatcher;
pub mod handle;
pub mod observer;
pub mod plan;
pub mod runtime;
pub mod state;

pub use core::{CoreCommand, CoreStep, LoadCoordinator};
pub use dispatcher::CompletionDispatcher;
pub use handle::SessionHandle;
pub use observer::{SessionObserver, TracingObserver};
pub use plan::{DispatchPlan, plan_rounds};
pub use runtime::Runtime;
pub use state::CoordinatorState;
