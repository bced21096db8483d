// src/lib.rs

pub mod cli;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod fetch;
pub mod fs;
pub mod logging;
pub mod manifest;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::engine::{
    LoadCoordinator, Runtime, RuntimeEvent, SessionHandle, TracingObserver, plan_rounds,
};
use crate::fetch::{FileFetchBackend, preload};
use crate::fs::{FileSystem, RealFileSystem};
use crate::manifest::{Manifest, load_and_validate};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading
/// - the preload phase
/// - coordinator / runtime / file fetch backend
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let manifest_path = PathBuf::from(&args.manifest);
    let manifest = load_and_validate(&manifest_path)?;

    if args.dry_run {
        print_dry_run(&manifest);
        return Ok(());
    }

    let root = resource_root(&manifest_path, args.root.as_deref());
    info!(root = %root.display(), units = manifest.units.len(), "loading manifest resources");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let (runtime, handle) = build_session(&manifest, &root, fs).await?;

    // Ctrl-C → cancel the session; in-flight units are allowed to report.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        if let Err(err) = handle.cancel().await {
            debug!(error = %err, "session already ended; cancel request dropped");
        }
    });

    let stats = runtime.run().await?;
    debug!(?stats, "session complete");
    Ok(())
}

/// Preload the manifest's non-gated resources, then build a runtime that
/// loads the gated units from `root` through `fs`.
///
/// The returned handle can cancel the session or report on behalf of a
/// custom backend.
pub async fn build_session(
    manifest: &Manifest,
    root: &Path,
    fs: Arc<dyn FileSystem>,
) -> errors::Result<(Runtime<FileFetchBackend>, SessionHandle)> {
    let preloaded = preload(Arc::clone(&fs), root, manifest).await?;
    let core = LoadCoordinator::new(manifest.units.clone())?.with_preloaded(preloaded);

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let fetcher = FileFetchBackend::new(root, fs, rt_tx.clone());
    let runtime = Runtime::new(core, rt_rx, fetcher).with_observer(TracingObserver);

    Ok((runtime, SessionHandle::new(rt_tx)))
}

/// Figure out which directory resource urls are relative to.
///
/// - An explicit `--root` wins.
/// - If the manifest path has a non-empty parent (e.g. "site/loadgate.json"),
///   we use that directory.
/// - If it's just a bare filename like "loadgate.json" (parent = ""),
///   we fall back to the current working directory "."
pub fn resource_root(manifest_path: &Path, root: Option<&str>) -> PathBuf {
    if let Some(root) = root {
        return PathBuf::from(root);
    }
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print resources, deps and dispatch rounds.
fn print_dry_run(manifest: &Manifest) {
    println!("loadgate dry-run");
    println!();

    if !manifest.styles.is_empty() {
        println!("styles ({}):", manifest.styles.len());
        for url in manifest.styles.iter() {
            println!("  - {url}");
        }
    }
    if !manifest.head.is_empty() {
        println!("head scripts ({}):", manifest.head.len());
        for url in manifest.head.iter() {
            println!("  - {url}");
        }
    }

    println!("units ({}):", manifest.units.len());
    for unit in manifest.units.iter() {
        println!("  - {}", unit.id);
        println!("      resource: {}", unit.resource);
        if !unit.depends_on.is_empty() {
            println!("      depends_on: {:?}", unit.depends_on);
        }
    }
    println!();

    match plan_rounds(manifest.units.clone()) {
        Ok(plan) => {
            println!("dispatch rounds ({}):", plan.rounds.len());
            print!("{plan}");
        }
        Err(err) => println!("session would fail: {err}"),
    }

    debug!("dry-run complete (nothing loaded)");
}
