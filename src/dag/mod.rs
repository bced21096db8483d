// src/dag/mod.rs

//! Dependency bookkeeping for a load session.
//!
//! - [`unit`] defines the loadable unit and the descriptor it is built from.
//! - [`registry`] holds the pending units and clears completed dependencies.
//! - [`eligibility`] finds units that can start right now.
//! - [`diagnose`] explains a stalled registry (cycles, unregistered ids).

pub mod diagnose;
pub mod eligibility;
pub mod registry;
pub mod unit;

pub use diagnose::{MissingDependency, StallReport};
pub use eligibility::find_eligible;
pub use registry::TaskRegistry;
pub use unit::{Unit, UnitDescriptor};
