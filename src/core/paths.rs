// ─── Launcher Paths ───
// On-disk layout of an install root.

use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = ".genecraft";

/// Default install root: `%APPDATA%/.genecraft` on Windows,
/// `~/.genecraft/launcher` elsewhere.
pub fn default_root_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
            .join("launcher")
    }
}

#[derive(Debug, Clone)]
pub struct LauncherPaths {
    root: PathBuf,
}

impl LauncherPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.assets_dir().join("objects")
    }

    pub fn indexes_dir(&self) -> PathBuf {
        self.assets_dir().join("indexes")
    }

    pub fn log_configs_dir(&self) -> PathBuf {
        self.assets_dir().join("log_cfgs")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("launcher-logs")
    }

    pub fn login_cache_file(&self) -> PathBuf {
        self.root.join("login_cache.json")
    }

    pub fn embedded_java_path(&self) -> PathBuf {
        if cfg!(target_os = "windows") {
            self.root.join("runtime").join("bin").join("java.exe")
        } else {
            self.root.join("runtime").join("bin").join("java")
        }
    }

    pub fn asset_index_file(&self, index_id: &str) -> PathBuf {
        self.indexes_dir().join(format!("{}.json", index_id))
    }

    /// `versions/<name>/<name>.json`
    pub fn profile_config(&self, name: &str) -> PathBuf {
        self.versions_dir().join(name).join(format!("{}.json", name))
    }

    /// `versions/<name>/<name>.jar`
    pub fn profile_jar(&self, name: &str) -> PathBuf {
        self.versions_dir().join(name).join(format!("{}.jar", name))
    }

    /// Names of the directories under `versions/`, sorted. A missing
    /// `versions/` directory yields an empty list.
    pub async fn profile_names(&self) -> LauncherResult<Vec<String>> {
        let versions_dir = self.versions_dir();
        let mut entries = match tokio::fs::read_dir(&versions_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LauncherError::io(&versions_dir, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LauncherError::io(&versions_dir, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub async fn ensure_layout(&self) -> LauncherResult<()> {
        for dir in [
            self.libraries_dir(),
            self.objects_dir(),
            self.indexes_dir(),
            self.log_configs_dir(),
            self.versions_dir(),
        ] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| LauncherError::io(&dir, e))?;
        }
        Ok(())
    }
}
