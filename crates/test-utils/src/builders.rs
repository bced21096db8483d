#![allow(dead_code)]

use loadgate::dag::UnitDescriptor;
use loadgate::manifest::{Manifest, ManifestEntry, RawManifest};

/// Builder for `UnitDescriptor` to simplify test setup.
///
/// The resource defaults to `"<id>.js"`.
pub struct UnitBuilder {
    unit: UnitDescriptor,
}

impl UnitBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            unit: UnitDescriptor::new(id, format!("{id}.js")),
        }
    }

    pub fn resource(mut self, resource: &str) -> Self {
        self.unit.resource = resource.to_string();
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.unit.depends_on.push(dep.to_string());
        self
    }

    pub fn build(self) -> UnitDescriptor {
        self.unit
    }
}

/// Build descriptors from `(id, deps)` pairs, in the given order.
pub fn units(pairs: &[(&str, &[&str])]) -> Vec<UnitDescriptor> {
    pairs.iter()
        .map(|(id, deps)| {
            deps.iter()
                .fold(UnitBuilder::new(id), |b, dep| b.after(dep))
                .build()
        })
        .collect()
}

/// Builder for a validated `Manifest`.
pub struct ManifestBuilder {
    entries: Vec<ManifestEntry>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn style(mut self, url: &str) -> Self {
        self.entries.push(ManifestEntry {
            url: Some(url.to_string()),
            css: true,
            ..ManifestEntry::default()
        });
        self
    }

    pub fn head(mut self, url: &str) -> Self {
        self.entries.push(ManifestEntry {
            url: Some(url.to_string()),
            head: true,
            ..ManifestEntry::default()
        });
        self
    }

    pub fn unit(mut self, slug: &str, url: &str, deps: &[&str]) -> Self {
        self.entries.push(ManifestEntry {
            url: Some(url.to_string()),
            slug: Some(slug.to_string()),
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            ..ManifestEntry::default()
        });
        self
    }

    pub fn build(self) -> Manifest {
        Manifest::try_from(RawManifest::List(self.entries))
            .expect("Failed to build valid manifest from builder")
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
