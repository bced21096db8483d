// src/fetch/preload.rs

//! Non-gated resources fetched before the session starts.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::LoadError;
use crate::fs::FileSystem;
use crate::manifest::Manifest;

/// Fetch the manifest's styles, then its head scripts, one at a time.
///
/// Stops at the first resource that cannot be read. Returns how many
/// resources were loaded.
pub async fn preload(
    fs: Arc<dyn FileSystem>,
    root: &Path,
    manifest: &Manifest,
) -> Result<usize, LoadError> {
    let resources: Vec<&String> = manifest.styles.iter().chain(manifest.head.iter()).collect();
    if resources.is_empty() {
        return Ok(0);
    }

    info!(
        styles = manifest.styles.len(),
        head = manifest.head.len(),
        "preloading non-gated resources"
    );

    for resource in resources.iter() {
        let path = root.join(resource.as_str());
        let fs = Arc::clone(&fs);

        let read = tokio::task::spawn_blocking(move || fs.read(&path))
            .await
            .map_err(|e| LoadError::Fetch {
                id: resource.to_string(),
                reason: format!("preload task aborted: {e}"),
            })?;

        match read {
            Ok(bytes) => debug!(resource = %resource, bytes = bytes.len(), "preloaded"),
            Err(err) => {
                return Err(LoadError::Fetch {
                    id: resource.to_string(),
                    reason: format!("{err:#}"),
                });
            }
        }
    }

    Ok(resources.len())
}
