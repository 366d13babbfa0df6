use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::cancel::CancelToken;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{get_bytes, HttpTransport};
use crate::core::java;
use crate::core::launch::run_java;
use crate::core::maven::MavenArtifact;

/// The per-installation manifest the Fabric installer writes to
/// `versions/<name>/<name>.json`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricProfile {
    pub id: Option<String>,
    #[serde(default)]
    pub inherits_from: Option<String>,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub libraries: Vec<FabricLibrary>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FabricLibrary {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl FabricProfile {
    /// A missing file means "no extra libraries", not an error.
    pub async fn load(path: &Path) -> LauncherResult<Option<Self>> {
        match tokio::fs::read(path).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LauncherError::io(path, e)),
        }
    }

    /// Library jars under `libraries_dir`, in declaration order. Entries with
    /// malformed coordinates are skipped.
    pub fn classpath_entries(&self, libraries_dir: &Path) -> Vec<PathBuf> {
        self.libraries
            .iter()
            .filter_map(|lib| match MavenArtifact::parse(&lib.name) {
                Ok(artifact) => Some(libraries_dir.join(artifact.local_path())),
                Err(e) => {
                    warn!("Skipping mod loader library: {}", e);
                    None
                }
            })
            .collect()
    }
}

pub struct FabricInstaller {
    transport: Arc<dyn HttpTransport>,
    installer_url: String,
    minimum_java: String,
}

impl FabricInstaller {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        installer_url: impl Into<String>,
        minimum_java: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            installer_url: installer_url.into(),
            minimum_java: minimum_java.into(),
        }
    }

    /// Fetch the installer jar into `temp_dir` under a unique name.
    pub async fn download_installer(&self, temp_dir: &Path) -> LauncherResult<PathBuf> {
        info!("Downloading Fabric installer from {}", self.installer_url);
        let bytes = get_bytes(self.transport.as_ref(), &self.installer_url).await?;

        tokio::fs::create_dir_all(temp_dir)
            .await
            .map_err(|e| LauncherError::io(temp_dir, e))?;
        let dest = temp_dir.join(format!("fabric-installer-{}.jar", Uuid::new_v4()));
        tokio::fs::write(&dest, &bytes)
            .await
            .map_err(|e| LauncherError::io(&dest, e))?;
        debug!("Fabric installer saved to {:?}", dest);
        Ok(dest)
    }

    /// `<java> -jar <installer> client -dir <root> -mcversion <version>`.
    /// Java is checked against the minimum first.
    pub async fn run_installer(
        &self,
        java_bin: &Path,
        installer: &Path,
        install_root: &Path,
        game_version: &str,
        cancel: &CancelToken,
    ) -> LauncherResult<()> {
        java::ensure_minimum(java_bin, &self.minimum_java).await?;

        tokio::fs::create_dir_all(install_root)
            .await
            .map_err(|e| LauncherError::io(install_root, e))?;

        let argv = installer_args(installer, install_root, game_version);
        let status = run_java(java_bin, &argv, install_root, &[], cancel).await?;
        if !status.success() {
            return Err(LauncherError::Loader(format!(
                "Fabric installer exited with {}",
                status
            )));
        }

        info!("Fabric installed for Minecraft {}", game_version);
        Ok(())
    }

    /// Download, run, and clean up the installer.
    pub async fn install(
        &self,
        java_bin: &Path,
        install_root: &Path,
        game_version: &str,
        cancel: &CancelToken,
    ) -> LauncherResult<()> {
        let installer = self.download_installer(&std::env::temp_dir()).await?;
        let result = self
            .run_installer(java_bin, &installer, install_root, game_version, cancel)
            .await;
        if let Err(e) = tokio::fs::remove_file(&installer).await {
            debug!("Could not remove {:?}: {}", installer, e);
        }
        result
    }
}

fn installer_args(installer: &Path, install_root: &Path, game_version: &str) -> Vec<String> {
    vec![
        "-jar".to_string(),
        installer.to_string_lossy().to_string(),
        "client".to_string(),
        "-dir".to_string(),
        install_root.to_string_lossy().to_string(),
        "-mcversion".to_string(),
        game_version.to_string(),
    ]
}
