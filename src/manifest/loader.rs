// src/manifest/loader.rs

use std::path::Path;

use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::manifest::model::{Manifest, RawManifest};

/// On-disk manifest syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Toml,
}

impl ManifestFormat {
    /// `.toml` files are TOML; anything else is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ManifestFormat::Toml,
            _ => ManifestFormat::Json,
        }
    }
}

/// Deserialize manifest text; no semantic validation.
pub fn parse_manifest(contents: &str, format: ManifestFormat) -> Result<RawManifest> {
    let raw = match format {
        ManifestFormat::Json => serde_json::from_str(contents)?,
        ManifestFormat::Toml => toml::from_str(contents)?,
    };
    Ok(raw)
}

/// Load a manifest through `fs` and return the raw `RawManifest`.
pub fn load_from_path_with(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawManifest> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path)?;
    parse_manifest(&contents, ManifestFormat::from_path(path))
}

/// Load a manifest from disk and return the raw `RawManifest`.
///
/// This only performs deserialization; use [`load_and_validate`] for the
/// checks on urls, slugs and unit ids.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawManifest> {
    load_from_path_with(&RealFileSystem, path)
}

/// Load a manifest through `fs` and validate it.
pub fn load_and_validate_with(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<Manifest> {
    let raw = load_from_path_with(fs, path)?;
    Manifest::try_from(raw)
}

/// Load a manifest from disk and validate it.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads JSON or TOML (by file extension).
/// - Applies entry defaults (handled by `serde`).
/// - Checks for:
///   - entries without a url,
///   - gated entries without a slug,
///   - duplicate slugs and self-dependencies.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Manifest> {
    load_and_validate_with(&RealFileSystem, path)
}
