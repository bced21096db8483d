// src/manifest/validate.rs

use crate::dag::{TaskRegistry, UnitDescriptor};
use crate::errors::{LoadError, LoadgateError, Result};
use crate::manifest::model::{EntryKind, Manifest, RawManifest};

impl TryFrom<RawManifest> for Manifest {
    type Error = LoadgateError;

    fn try_from(raw: RawManifest) -> std::result::Result<Self, Self::Error> {
        let manifest = split_entries(raw)?;
        validate_units(&manifest)?;
        Ok(manifest)
    }
}

fn split_entries(raw: RawManifest) -> Result<Manifest> {
    let entries = raw.into_entries();
    if entries.is_empty() {
        return Err(LoadgateError::ManifestError(
            "manifest must contain at least one resource".to_string(),
        ));
    }

    let mut manifest = Manifest::default();

    for (index, entry) in entries.into_iter().enumerate() {
        let kind = entry.kind();
        let url = match entry.url {
            Some(url) if !url.trim().is_empty() => url,
            _ => {
                return Err(LoadError::Validation(format!(
                    "manifest entry #{index} has no url"
                ))
                .into());
            }
        };

        match kind {
            EntryKind::HeadScript => manifest.head.push(url),
            EntryKind::Style => manifest.styles.push(url),
            EntryKind::Gated => {
                let slug = match entry.slug {
                    Some(slug) if !slug.trim().is_empty() => slug,
                    _ => {
                        return Err(LoadError::Validation(format!(
                            "manifest entry #{index} ('{url}') is loaded asynchronously and needs a slug"
                        ))
                        .into());
                    }
                };

                manifest.units.push(UnitDescriptor {
                    id: slug,
                    resource: url,
                    depends_on: entry.depends_on,
                });
            }
        }
    }

    Ok(manifest)
}

/// Run the registry's own checks (duplicates, self-dependencies) up front so
/// a bad manifest is rejected at load time rather than at session start.
///
/// Cycles and unregistered dependencies are left to the coordinator.
fn validate_units(manifest: &Manifest) -> Result<()> {
    let mut registry = TaskRegistry::new();
    registry.register(manifest.units.iter().cloned())?;
    Ok(())
}
