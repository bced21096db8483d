// src/engine/observer.rs

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::SessionEvent;

/// Receives every [`SessionEvent`] the coordinator emits, in order.
pub trait SessionObserver: Send {
    fn on_event(&mut self, event: &SessionEvent);
}

/// Logs session events; prints the completion summary on `AllDone`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn on_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Started { id } => debug!(unit = %id, "unit started"),
            SessionEvent::Finished { id } => debug!(unit = %id, "unit finished"),
            SessionEvent::AllDone(stats) => {
                info!("loadgate has finished!");
                info!("{stats}");
            }
            SessionEvent::FatalError(err) => error!(error = %err, "loadgate session failed"),
        }
    }
}

/// Forward events to a channel; a dropped receiver is not an error.
impl SessionObserver for mpsc::UnboundedSender<SessionEvent> {
    fn on_event(&mut self, event: &SessionEvent) {
        let _ = self.send(event.clone());
    }
}
