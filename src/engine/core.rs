// src/engine/core.rs

//! Pure coordinator state machine.
//!
//! [`LoadCoordinator`] consumes [`RuntimeEvent`]s and produces:
//! - an updated session state
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels, handing units to the fetch backend and forwarding
//! session events to observers.
//!
//! Scan requests are coalesced: [`LoadCoordinator::handle`] only records that
//! a scan is needed, and [`LoadCoordinator::flush`] runs at most one
//! scan-and-dispatch pass no matter how many notifications asked for it.
//! Because every transition goes through `&mut self`, two passes can never
//! overlap.

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::{debug, error, info, trace, warn};

use crate::dag::{StallReport, TaskRegistry, Unit, UnitDescriptor, find_eligible};
use crate::engine::dispatcher::CompletionDispatcher;
use crate::engine::state::CoordinatorState;
use crate::engine::{RuntimeEvent, SessionEvent};
use crate::errors::LoadError;
use crate::types::{SessionStats, UnitId};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Hand these units to the fetch backend. Each unit appears in exactly one
    /// `BeginUnits` per session.
    BeginUnits(Vec<Unit>),
    /// Forward this event to session observers.
    Notify(SessionEvent),
}

/// Decision returned by the core after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the session is still live.
    pub keep_running: bool,
}

impl CoreStep {
    /// Units dispatched by this step, in dispatch order.
    pub fn dispatched(&self) -> Vec<&Unit> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::BeginUnits(units) => Some(units.iter()),
                CoreCommand::Notify(_) => None,
            })
            .flatten()
            .collect()
    }

    /// Ids dispatched by this step, in dispatch order.
    pub fn dispatched_ids(&self) -> Vec<UnitId> {
        self.dispatched().into_iter().map(|u| u.id.clone()).collect()
    }

    /// Session events emitted by this step.
    pub fn events(&self) -> Vec<&SessionEvent> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::Notify(event) => Some(event),
                CoreCommand::BeginUnits(_) => None,
            })
            .collect()
    }

    /// The terminal event emitted by this step, if any.
    pub fn terminal_event(&self) -> Option<&SessionEvent> {
        self.events().into_iter().find(|e| e.is_terminal())
    }
}

/// Dependency-gated scheduler for one load session.
///
/// Owns the registry and the completion protocol; has no channels, no Tokio
/// types, and performs no IO.
#[derive(Debug)]
pub struct LoadCoordinator {
    registry: TaskRegistry,
    dispatcher: CompletionDispatcher,
    state: CoordinatorState,
    /// Set by notifications that may have made new units eligible; consumed
    /// by the next `flush`.
    rescan_pending: bool,
    cancel_requested: bool,
    units_registered: usize,
    preloaded: usize,
    started_at: Instant,
    outcome: Option<Result<SessionStats, LoadError>>,
}

impl LoadCoordinator {
    /// Register `descriptors` and build an idle coordinator.
    ///
    /// Fails with `LoadError::Validation` before anything is dispatched if
    /// any descriptor is malformed.
    pub fn new(
        descriptors: impl IntoIterator<Item = UnitDescriptor>,
    ) -> Result<Self, LoadError> {
        let mut registry = TaskRegistry::new();
        registry.register(descriptors)?;
        let units_registered = registry.len();

        Ok(Self {
            registry,
            dispatcher: CompletionDispatcher::new(),
            state: CoordinatorState::Idle,
            rescan_pending: false,
            cancel_requested: false,
            units_registered,
            preloaded: 0,
            started_at: Instant::now(),
            outcome: None,
        })
    }

    /// Record resources fetched outside the gated session, for reporting.
    pub fn with_preloaded(mut self, preloaded: usize) -> Self {
        self.preloaded = preloaded;
        self
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn in_flight(&self) -> &BTreeSet<UnitId> {
        self.dispatcher.in_flight()
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    /// Terminal result, once the session has ended.
    pub fn outcome(&self) -> Option<&Result<SessionStats, LoadError>> {
        self.outcome.as_ref()
    }

    /// Live counters (frozen copy is carried by `AllDone`).
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            units_registered: self.units_registered,
            units_completed: self.dispatcher.completed_count(),
            preloaded: self.preloaded,
            elapsed: self.started_at.elapsed(),
        }
    }

    /// Leave `Idle` and run the first scan.
    pub fn start(&mut self) -> CoreStep {
        if self.state != CoordinatorState::Idle {
            warn!(state = %self.state, "start called on a session that already started; ignoring");
            return self.collect(Vec::new());
        }

        info!(units = self.units_registered, "starting load session");
        self.state = CoordinatorState::Scanning;
        self.rescan_pending = true;
        self.flush()
    }

    /// Record one notification. Does not scan; call [`flush`](Self::flush)
    /// once the current batch of notifications has been handled.
    pub fn handle(&mut self, event: RuntimeEvent) {
        if self.state.is_terminal() {
            debug!(?event, state = %self.state, "session already ended; ignoring notification");
            return;
        }

        match event {
            RuntimeEvent::UnitFinished { id } => self.on_unit_finished(&id),
            RuntimeEvent::UnitFailed { id, reason } => {
                warn!(unit = %id, reason = %reason, "fetch backend reported failure");
                let err = self.dispatcher.failed(&id, reason);
                self.fail(err);
            }
            RuntimeEvent::CancelRequested => {
                if !self.cancel_requested {
                    info!(
                        in_flight = self.dispatcher.in_flight().len(),
                        "cancellation requested; suppressing further dispatch"
                    );
                    self.cancel_requested = true;
                }
            }
        }
    }

    /// Act on everything recorded since the last flush: at most one
    /// scan-and-dispatch pass, or a terminal transition.
    pub fn flush(&mut self) -> CoreStep {
        let mut commands = Vec::new();

        if !self.state.is_terminal() && self.state != CoordinatorState::Idle {
            if self.cancel_requested {
                if self.dispatcher.in_flight().is_empty() {
                    self.fail(LoadError::Cancelled);
                } else {
                    debug!(
                        in_flight = self.dispatcher.in_flight().len(),
                        "cancelling; waiting for in-flight units to drain"
                    );
                }
            } else if self.rescan_pending {
                self.rescan_pending = false;
                self.scan_and_dispatch(&mut commands);
            } else if self.dispatcher.in_flight().is_empty() && self.registry.is_empty() {
                self.finish();
            }
        }

        self.collect(commands)
    }

    /// `handle` followed by `flush`.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        self.handle(event);
        self.flush()
    }

    fn on_unit_finished(&mut self, id: &str) {
        if let Err(err) = self.dispatcher.finished(id) {
            self.fail(err);
            return;
        }

        let dependency_cleared = self.registry.remove(id);
        debug!(
            unit = %id,
            dependency_cleared,
            remaining = self.registry.len(),
            in_flight = self.dispatcher.in_flight().len(),
            "unit finished"
        );

        if self.cancel_requested {
            return;
        }

        if dependency_cleared {
            self.rescan_pending = true;
        } else if self.dispatcher.in_flight().is_empty() && !self.registry.is_empty() {
            // Re-check before declaring a deadlock.
            self.rescan_pending = true;
        }
    }

    fn scan_and_dispatch(&mut self, commands: &mut Vec<CoreCommand>) {
        self.state = CoordinatorState::Scanning;
        let eligible = find_eligible(&self.registry, self.dispatcher.in_flight());

        if eligible.is_empty() {
            if !self.dispatcher.in_flight().is_empty() {
                trace!(
                    in_flight = self.dispatcher.in_flight().len(),
                    "nothing newly eligible; waiting on in-flight units"
                );
                self.state = CoordinatorState::WaitingOnInFlight;
            } else if self.registry.is_empty() {
                self.finish();
            } else {
                let report = StallReport::from_registry(&self.registry);
                self.fail(LoadError::CycleOrMissingDependency(report));
            }
            return;
        }

        self.state = CoordinatorState::Dispatching;
        for unit in eligible.iter() {
            if let Err(err) = self.dispatcher.started(&unit.id) {
                self.fail(err);
                return;
            }
        }

        info!(
            units = ?eligible.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(),
            in_flight = self.dispatcher.in_flight().len(),
            remaining = self.registry.len(),
            "dispatching eligible units"
        );

        commands.push(CoreCommand::BeginUnits(eligible));
        self.state = CoordinatorState::WaitingOnInFlight;
    }

    fn finish(&mut self) {
        self.state = CoordinatorState::Draining;
        let stats = self.stats();
        info!(
            units_completed = stats.units_completed,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "all units loaded"
        );
        self.dispatcher.all_done(stats);
        self.outcome = Some(Ok(stats));
        self.state = CoordinatorState::Finished;
    }

    fn fail(&mut self, err: LoadError) {
        if self.state.is_terminal() {
            debug!(error = %err, state = %self.state, "session already ended; ignoring error");
            return;
        }

        error!(error = %err, "load session failed");
        self.state = CoordinatorState::Failed;
        self.rescan_pending = false;
        self.outcome = Some(Err(err.clone()));
        self.dispatcher.fatal(err);
    }

    /// Session events first (in emission order), then dispatch commands.
    fn collect(&mut self, mut dispatch: Vec<CoreCommand>) -> CoreStep {
        let mut commands: Vec<CoreCommand> = self
            .dispatcher
            .drain()
            .into_iter()
            .map(CoreCommand::Notify)
            .collect();
        commands.append(&mut dispatch);

        CoreStep {
            commands,
            keep_running: !self.state.is_terminal(),
        }
    }
}
