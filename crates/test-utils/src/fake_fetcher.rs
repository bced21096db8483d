use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use loadgate::dag::Unit;
use loadgate::engine::RuntimeEvent;
use loadgate::errors::Result;
use loadgate::fetch::FetchBackend;
use tokio::sync::mpsc;

/// A fake fetch backend that:
/// - records which units were dispatched, in dispatch order
/// - reports each unit as finished, unless told otherwise:
///   - `failing` units report `UnitFailed`
///   - `held` units report nothing (the test reports for them)
///   - `doubled` units report `UnitFinished` twice
/// - optionally reports from spawned tasks, so completions interleave with
///   the runtime loop instead of arriving in dispatch order.
pub struct FakeFetcher {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    dispatched: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
    held: HashSet<String>,
    doubled: HashSet<String>,
    spawned: bool,
}

impl FakeFetcher {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        dispatched: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            dispatched,
            failing: HashSet::new(),
            held: HashSet::new(),
            doubled: HashSet::new(),
            spawned: false,
        }
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn holding(mut self, id: &str) -> Self {
        self.held.insert(id.to_string());
        self
    }

    pub fn reporting_twice(mut self, id: &str) -> Self {
        self.doubled.insert(id.to_string());
        self
    }

    pub fn spawned(mut self) -> Self {
        self.spawned = true;
        self
    }

    fn reports_for(&self, unit: &Unit) -> Vec<RuntimeEvent> {
        let id = unit.id.clone();
        if self.held.contains(&id) {
            Vec::new()
        } else if self.failing.contains(&id) {
            vec![RuntimeEvent::UnitFailed {
                id,
                reason: "simulated fetch failure".to_string(),
            }]
        } else if self.doubled.contains(&id) {
            vec![
                RuntimeEvent::UnitFinished { id: id.clone() },
                RuntimeEvent::UnitFinished { id },
            ]
        } else {
            vec![RuntimeEvent::UnitFinished { id }]
        }
    }
}

impl FetchBackend for FakeFetcher {
    fn begin_units(
        &mut self,
        units: Vec<Unit>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);
        let reports: Vec<Vec<RuntimeEvent>> = units.iter().map(|u| self.reports_for(u)).collect();
        let spawned = self.spawned;

        Box::pin(async move {
            for (unit, events) in units.into_iter().zip(reports) {
                {
                    let mut guard = dispatched.lock().unwrap();
                    guard.push(unit.id.clone());
                }

                if spawned {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        tokio::task::yield_now().await;
                        for event in events {
                            let _ = tx.send(event).await;
                        }
                    });
                } else {
                    for event in events {
                        tx.send(event).await.map_err(anyhow::Error::from)?;
                    }
                }
            }
            Ok(())
        })
    }
}
