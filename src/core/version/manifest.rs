// ─── Version Manifest ───
// Handles fetching and parsing the Mojang version manifest and resolving a
// version id to its descriptor.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::version_file::VersionDescriptor;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{get_json, HttpTransport};

/// Top-level Mojang version manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    #[serde(default)]
    pub snapshot: Option<String>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionRef {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    #[serde(default, rename = "releaseTime")]
    pub release_time: Option<String>,
}

impl Manifest {
    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionRef> {
        self.versions.iter().find(|v| v.id == id)
    }
}

pub struct ManifestClient {
    transport: Arc<dyn HttpTransport>,
    manifest_url: String,
}

impl ManifestClient {
    pub fn new(transport: Arc<dyn HttpTransport>, manifest_url: impl Into<String>) -> Self {
        Self {
            transport,
            manifest_url: manifest_url.into(),
        }
    }

    pub async fn fetch_manifest(&self) -> LauncherResult<Manifest> {
        info!("Fetching version manifest...");
        let manifest: Manifest = get_json(self.transport.as_ref(), &self.manifest_url).await?;
        info!(
            "Loaded {} versions from manifest (latest release {})",
            manifest.versions.len(),
            manifest.latest.release
        );
        Ok(manifest)
    }

    /// Resolve `version_id` against `manifest`. An unknown id fails before
    /// any network access.
    pub async fn resolve_version(
        &self,
        manifest: &Manifest,
        version_id: &str,
    ) -> LauncherResult<VersionDescriptor> {
        let entry = manifest
            .find_version(version_id)
            .ok_or_else(|| LauncherError::VersionNotFound(version_id.to_string()))?;

        info!("Resolving version {} from {}", entry.id, entry.url);
        get_json(self.transport.as_ref(), &entry.url).await
    }

    /// Fetch the manifest and resolve one version from it.
    pub async fn fetch_version(&self, version_id: &str) -> LauncherResult<VersionDescriptor> {
        let manifest = self.fetch_manifest().await?;
        self.resolve_version(&manifest, version_id).await
    }
}
