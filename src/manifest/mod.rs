// src/manifest/mod.rs

//! Manifest loading and validation.
//!
//! Responsibilities:
//! - Define the JSON/TOML-backed data model (`model.rs`).
//! - Load a manifest from disk (`loader.rs`).
//! - Split it into preloaded and gated resources and validate entries
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    ManifestFormat, load_and_validate, load_and_validate_with, load_from_path, parse_manifest,
};
pub use model::{EntryKind, Manifest, ManifestEntry, RawManifest};
