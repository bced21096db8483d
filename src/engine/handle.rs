// src/engine/handle.rs

use tokio::sync::mpsc;

use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};

/// Cloneable handle for talking to a running session from outside the
/// runtime loop (Ctrl-C handler, tests, custom fetch backends).
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<RuntimeEvent>,
}

impl SessionHandle {
    pub fn new(tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self { tx }
    }

    /// Suppress further dispatch; the session fails with `Cancelled` once
    /// everything in flight has reported.
    pub async fn cancel(&self) -> Result<()> {
        self.send(RuntimeEvent::CancelRequested).await
    }

    pub async fn finished(&self, id: impl Into<String>) -> Result<()> {
        self.send(RuntimeEvent::UnitFinished { id: id.into() }).await
    }

    pub async fn failed(&self, id: impl Into<String>, reason: impl Into<String>) -> Result<()> {
        self.send(RuntimeEvent::UnitFailed {
            id: id.into(),
            reason: reason.into(),
        })
        .await
    }

    /// Raw sender, for backends that report on their own.
    pub fn sender(&self) -> mpsc::Sender<RuntimeEvent> {
        self.tx.clone()
    }

    async fn send(&self, event: RuntimeEvent) -> Result<()> {
        self.tx.send(event).await.map_err(Error::from)?;
        Ok(())
    }
}
