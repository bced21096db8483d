// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::dag::Unit;
use crate::errors::{LoadgateError, Result};
use crate::fetch::FetchBackend;
use crate::types::SessionStats;

use super::core::{CoreStep, LoadCoordinator};
use super::observer::SessionObserver;
use super::{CoreCommand, RuntimeEvent, SessionEvent};

/// Drives a [`LoadCoordinator`] in response to `RuntimeEvent`s, and
/// delegates the actual retrieval of units to a [`FetchBackend`].
///
/// This is the single actor that owns the coordinator: notifications are
/// read from one channel and applied one at a time, so scan-and-dispatch
/// passes never overlap. Every notification already queued when the loop
/// wakes up is applied before the next pass, which coalesces bursts of
/// completions into one scan.
///
/// The channel is also read while a backend's `begin_units` future runs, so
/// a backend may report from inside that future even when a batch is wider
/// than the channel capacity. Events read that way wait in `backlog` until
/// the core is ready for them.
pub struct Runtime<F: FetchBackend> {
    core: LoadCoordinator,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backlog: VecDeque<RuntimeEvent>,
    fetcher: F,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl<F: FetchBackend> fmt::Debug for Runtime<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("backlog", &self.backlog.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl<F: FetchBackend> Runtime<F> {
    pub fn new(
        core: LoadCoordinator,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        fetcher: F,
    ) -> Self {
        Self {
            core,
            event_rx,
            backlog: VecDeque::new(),
            fetcher,
            observers: Vec::new(),
        }
    }

    /// Register an observer for every session event.
    pub fn with_observer(mut self, observer: impl SessionObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Main event loop.
    ///
    /// - Starts the session (first scan + dispatch).
    /// - Consumes `RuntimeEvent`s from `event_rx` until the session ends.
    /// - Returns the final stats on `AllDone`, or the session's error.
    pub async fn run(mut self) -> Result<SessionStats> {
        info!("loadgate runtime started");

        let step = self.core.start();
        let mut keep_running = self.execute_step(step).await?;

        while keep_running {
            let next = match self.backlog.pop_front() {
                Some(e) => Some(e),
                None => self.event_rx.recv().await,
            };
            let event = match next {
                Some(e) => e,
                None => {
                    let in_flight = self.core.in_flight().len();
                    error!(in_flight, "runtime event channel closed before the session ended");
                    return Err(LoadgateError::ChannelClosed(in_flight));
                }
            };

            debug!(?event, "runtime received event");
            self.core.handle(event);

            let mut batched = 1usize;
            while let Some(event) = self.backlog.pop_front() {
                self.core.handle(event);
                batched += 1;
            }
            while let Ok(event) = self.event_rx.try_recv() {
                debug!(?event, "runtime received queued event");
                self.core.handle(event);
                batched += 1;
            }
            if batched > 1 {
                debug!(batched, "coalesced notifications into a single scan");
            }

            let step = self.core.flush();
            keep_running = self.execute_step(step).await?;
        }

        info!(state = %self.core.state(), "runtime exiting");

        match self.core.outcome() {
            Some(Ok(stats)) => Ok(*stats),
            Some(Err(err)) => Err(err.clone().into()),
            None => Err(anyhow!("runtime stopped before the session ended").into()),
        }
    }

    /// Execute the commands of one core step.
    ///
    /// If the backend refuses a batch, every unit in it is reported as
    /// failed and the resulting (terminal) step is executed as well.
    async fn execute_step(&mut self, mut step: CoreStep) -> Result<bool> {
        loop {
            let mut refused: Vec<RuntimeEvent> = Vec::new();

            for command in step.commands {
                match command {
                    CoreCommand::Notify(event) => self.notify(&event),
                    CoreCommand::BeginUnits(units) => {
                        if let Err(err) = self.begin_units(units.clone()).await {
                            warn!(error = %err, "fetch backend refused dispatch");
                            let reason = err.to_string();
                            refused.extend(units.into_iter().map(|u| RuntimeEvent::UnitFailed {
                                id: u.id,
                                reason: reason.clone(),
                            }));
                        }
                    }
                }
            }

            if refused.is_empty() {
                return Ok(step.keep_running);
            }

            for event in refused {
                self.core.handle(event);
            }
            step = self.core.flush();
        }
    }

    fn notify(&mut self, event: &SessionEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(event);
        }
    }

    async fn begin_units(&mut self, units: Vec<Unit>) -> Result<()> {
        if units.is_empty() {
            return Ok(());
        }

        let ids: Vec<_> = units.iter().map(|u| u.id.as_str()).collect();
        debug!(?ids, "handing units to fetch backend");

        let mut dispatch = self.fetcher.begin_units(units);
        let mut channel_open = true;

        loop {
            tokio::select! {
                result = &mut dispatch => return result,
                event = self.event_rx.recv(), if channel_open => match event {
                    Some(event) => {
                        trace!(?event, "event received during dispatch; buffering");
                        self.backlog.push_back(event);
                    }
                    None => channel_open = false,
                },
            }
        }
    }
}
