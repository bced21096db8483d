// src/fetch/backend.rs

//! Pluggable fetch backend abstraction.
//!
//! The runtime talks to a `FetchBackend` instead of doing IO itself. This
//! makes it easy to swap in a fake backend in tests.
//!
//! - `FileFetchBackend` is the default implementation used by the `loadgate`
//!   binary. It reads each unit's resource through a [`FileSystem`] in its
//!   own Tokio task and reports back over the runtime event channel.
//! - Tests can provide their own `FetchBackend` that, for example, records
//!   which units were dispatched and directly emits `UnitFinished` events.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dag::Unit;
use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::fs::FileSystem;

/// Trait abstracting how dispatched units are retrieved.
///
/// An implementation must eventually report exactly one `UnitFinished` or
/// `UnitFailed` per unit it is given. Returning an error from
/// `begin_units` means none of the units were started; the runtime then
/// reports them as failed on the backend's behalf.
///
/// Reports may be sent from inside the returned future: the runtime keeps
/// reading its event channel until the future resolves.
pub trait FetchBackend: Send {
    fn begin_units(
        &mut self,
        units: Vec<Unit>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Reads every unit's resource from disk, resolving locators against `root`.
#[derive(Debug, Clone)]
pub struct FileFetchBackend {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl FileFetchBackend {
    pub fn new(
        root: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            root: root.into(),
            fs,
            runtime_tx,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FetchBackend for FileFetchBackend {
    fn begin_units(
        &mut self,
        units: Vec<Unit>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for unit in units {
                let path = self.root.join(&unit.resource);
                let fs = Arc::clone(&self.fs);
                let tx = self.runtime_tx.clone();

                tokio::spawn(async move {
                    let event = fetch_unit(fs, unit.id, path).await;
                    if tx.send(event).await.is_err() {
                        warn!("runtime event channel closed; dropping fetch report");
                    }
                });
            }
            Ok(())
        })
    }
}

async fn fetch_unit(fs: Arc<dyn FileSystem>, id: String, path: PathBuf) -> RuntimeEvent {
    debug!(unit = %id, path = %path.display(), "fetching resource");

    let read_path = path.clone();
    match tokio::task::spawn_blocking(move || fs.read(&read_path)).await {
        Ok(Ok(bytes)) => {
            debug!(unit = %id, bytes = bytes.len(), "resource loaded");
            RuntimeEvent::UnitFinished { id }
        }
        Ok(Err(err)) => RuntimeEvent::UnitFailed {
            id,
            reason: format!("{err:#}"),
        },
        Err(join_err) => RuntimeEvent::UnitFailed {
            id,
            reason: format!("fetch task for {} aborted: {join_err}", path.display()),
        },
    }
}
