use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use nbext_registry::{discover_descriptors, ExtensionDescriptor, ExtensionListing, InvalidListEntry};

#[async_trait]
/// Trait contract for where declared extension descriptors come from.
pub trait ExtensionSource: Send + Sync {
    fn describe(&self) -> String;

    /// Declared descriptors; unreadable entries come back in `invalid`.
    async fn list(&self) -> Result<ExtensionListing>;
}

#[derive(Debug, Clone)]
/// Descriptors discovered from yaml files under local nbextensions directories.
pub struct DirectoryExtensionSource {
    roots: Vec<PathBuf>,
}

impl DirectoryExtensionSource {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

#[async_trait]
impl ExtensionSource for DirectoryExtensionSource {
    fn describe(&self) -> String {
        self.roots
            .iter()
            .map(|root| root.display().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    async fn list(&self) -> Result<ExtensionListing> {
        let roots = self.roots.clone();
        let report = tokio::task::spawn_blocking(move || discover_descriptors(&roots))
            .await
            .context("nbextension discovery task failed")?;
        let mut listing = ExtensionListing::new(report.descriptors());
        for invalid in &report.invalid_entries {
            tracing::warn!(
                path = %invalid.yaml_path.display(),
                error = %invalid.error,
                "ignoring invalid nbextension descriptor"
            );
            listing.invalid.push(InvalidListEntry {
                require: None,
                error: format!("{}: {}", invalid.yaml_path.display(), invalid.error),
            });
        }
        Ok(listing)
    }
}

#[derive(Debug, Clone, Default)]
/// Fixed descriptor list; also used when no descriptor source is configured.
pub struct StaticExtensionSource {
    descriptors: Vec<ExtensionDescriptor>,
}

impl StaticExtensionSource {
    pub fn new(descriptors: Vec<ExtensionDescriptor>) -> Self {
        Self { descriptors }
    }
}

#[async_trait]
impl ExtensionSource for StaticExtensionSource {
    fn describe(&self) -> String {
        format!("static({})", self.descriptors.len())
    }

    async fn list(&self) -> Result<ExtensionListing> {
        Ok(ExtensionListing::new(self.descriptors.clone()))
    }
}
