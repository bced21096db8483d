// src/engine/dispatcher.rs

//! Completion protocol between the coordinator and fetch backends.
//!
//! The dispatcher owns the in-flight set and the record of reported units,
//! which is everything needed to enforce "exactly one report per dispatched
//! unit". It also buffers outgoing [`SessionEvent`]s and guarantees that only
//! one terminal event is ever emitted.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};

use crate::engine::SessionEvent;
use crate::errors::LoadError;
use crate::types::{SessionStats, UnitId};

#[derive(Debug, Default)]
pub struct CompletionDispatcher {
    in_flight: BTreeSet<UnitId>,
    dispatched: HashSet<UnitId>,
    reported: HashSet<UnitId>,
    completed: usize,
    terminal_emitted: bool,
    outbox: Vec<SessionEvent>,
}

impl CompletionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids dispatched but not yet reported.
    pub fn in_flight(&self) -> &BTreeSet<UnitId> {
        &self.in_flight
    }

    pub fn completed_count(&self) -> usize {
        self.completed
    }

    /// Mark `id` in flight and emit `Started`.
    ///
    /// Refuses an id that was already dispatched in this session.
    pub fn started(&mut self, id: &str) -> Result<(), LoadError> {
        if !self.dispatched.insert(id.to_string()) {
            return Err(LoadError::Protocol(format!(
                "unit '{id}' was already dispatched in this session"
            )));
        }

        self.in_flight.insert(id.to_string());
        self.outbox.push(SessionEvent::Started { id: id.to_string() });
        Ok(())
    }

    /// Accept a success report for `id` and emit `Finished`.
    pub fn finished(&mut self, id: &str) -> Result<(), LoadError> {
        self.accept_report(id)?;
        self.completed += 1;
        self.outbox.push(SessionEvent::Finished { id: id.to_string() });
        Ok(())
    }

    /// Accept a failure report for `id`, returning the fetch error it maps to.
    ///
    /// If the report itself breaks the protocol, the protocol error is
    /// returned instead.
    pub fn failed(&mut self, id: &str, reason: String) -> LoadError {
        match self.accept_report(id) {
            Ok(()) => LoadError::Fetch {
                id: id.to_string(),
                reason,
            },
            Err(protocol) => protocol,
        }
    }

    /// Emit `AllDone` unless a terminal event was already emitted.
    pub fn all_done(&mut self, stats: SessionStats) {
        if self.take_terminal_slot() {
            self.outbox.push(SessionEvent::AllDone(stats));
        }
    }

    /// Emit `FatalError` unless a terminal event was already emitted.
    pub fn fatal(&mut self, err: LoadError) {
        if self.take_terminal_slot() {
            self.outbox.push(SessionEvent::FatalError(err));
        } else {
            debug!(error = %err, "session already ended; dropping fatal error");
        }
    }

    /// Hand over every event buffered since the last drain.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn accept_report(&mut self, id: &str) -> Result<(), LoadError> {
        if self.reported.contains(id) {
            return Err(LoadError::Protocol(format!(
                "completion reported twice for unit '{id}'"
            )));
        }
        if !self.in_flight.remove(id) {
            return Err(LoadError::Protocol(format!(
                "completion reported for unit '{id}' which was never dispatched"
            )));
        }
        self.reported.insert(id.to_string());
        Ok(())
    }

    fn take_terminal_slot(&mut self) -> bool {
        if self.terminal_emitted {
            warn!("terminal session event requested twice; ignoring");
            return false;
        }
        self.terminal_emitted = true;
        true
    }
}
