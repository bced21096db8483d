// src/manifest/model.rs

use serde::Deserialize;

use crate::dag::UnitDescriptor;

/// Manifest as read from disk, before validation.
///
/// JSON manifests are usually a bare array of entries:
///
/// ```json
/// [
///   { "url": "css/site.css", "css": true },
///   { "url": "js/vendor.js", "head": true },
///   { "url": "js/core.js", "slug": "core" },
///   { "url": "js/app.js", "slug": "app", "dependsOn": ["core"] }
/// ]
/// ```
///
/// TOML manifests (and JSON objects) list entries under `resource`:
///
/// ```toml
/// [[resource]]
/// url = "js/core.js"
/// slug = "core"
///
/// [[resource]]
/// url = "js/app.js"
/// slug = "app"
/// depends_on = ["core"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawManifest {
    List(Vec<ManifestEntry>),
    Table {
        #[serde(default)]
        resource: Vec<ManifestEntry>,
    },
}

impl RawManifest {
    pub fn entries(&self) -> &[ManifestEntry] {
        match self {
            RawManifest::List(entries) => entries,
            RawManifest::Table { resource } => resource,
        }
    }

    pub fn into_entries(self) -> Vec<ManifestEntry> {
        match self {
            RawManifest::List(entries) => entries,
            RawManifest::Table { resource } => resource,
        }
    }
}

/// One manifest entry. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Resource locator; required for every entry.
    #[serde(default)]
    pub url: Option<String>,

    /// Unit id; required unless `head` or `css` is set.
    #[serde(default)]
    pub slug: Option<String>,

    /// Slugs this entry waits for.
    #[serde(default, alias = "depends_on")]
    pub depends_on: Vec<String>,

    /// Load before the gated session, as a head script.
    #[serde(default)]
    pub head: bool,

    /// Load before the gated session, as a stylesheet.
    #[serde(default)]
    pub css: bool,
}

/// Where a manifest entry ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Style,
    HeadScript,
    Gated,
}

impl ManifestEntry {
    /// `head` wins over `css`; everything else is gated.
    pub fn kind(&self) -> EntryKind {
        if self.head {
            EntryKind::HeadScript
        } else if self.css {
            EntryKind::Style
        } else {
            EntryKind::Gated
        }
    }
}

/// Validated manifest, split by how each resource is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Stylesheets, preloaded first.
    pub styles: Vec<String>,
    /// Head scripts, preloaded after the styles.
    pub head: Vec<String>,
    /// Gated units handed to the coordinator.
    pub units: Vec<UnitDescriptor>,
}

impl Manifest {
    /// Number of non-gated resources.
    pub fn preload_count(&self) -> usize {
        self.styles.len() + self.head.len()
    }
}
