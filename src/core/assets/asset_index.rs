use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::downloader::{FetchItem, HashAlgorithm};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{get_bytes, HttpTransport};
use crate::core::version::AssetIndexRef;

/// Top-level asset index JSON structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetIndex {
    /// Keyed by logical path, e.g. `minecraft/sounds/ambient/cave/cave1.ogg`.
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetObject {
    fn prefix(&self) -> LauncherResult<&str> {
        match self.hash.get(..2) {
            Some(prefix) if self.hash.chars().all(|c| c.is_ascii_hexdigit()) => Ok(prefix),
            _ => Err(LauncherError::InvalidHash(self.hash.clone())),
        }
    }

    /// `objects/<hash[0:2]>/<hash>`
    pub fn object_path(&self, objects_dir: &Path) -> LauncherResult<PathBuf> {
        Ok(objects_dir.join(self.prefix()?).join(&self.hash))
    }

    /// `<base>/<hash[0:2]>/<hash>`
    pub fn url(&self, resources_base: &str) -> LauncherResult<String> {
        Ok(format!(
            "{}/{}/{}",
            resources_base.trim_end_matches('/'),
            self.prefix()?,
            self.hash
        ))
    }
}

impl AssetIndex {
    /// Download the index and check it against the reference hash when one
    /// is declared. Returns the parsed index and the raw bytes for caching.
    pub async fn fetch(
        transport: &dyn HttpTransport,
        reference: &AssetIndexRef,
    ) -> LauncherResult<(Self, Vec<u8>)> {
        info!("Fetching asset index {}", reference.id);
        let raw = get_bytes(transport, &reference.url).await?;

        if let Some(expected) = &reference.sha1 {
            let actual = HashAlgorithm::Sha1.digest_hex(&raw);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LauncherError::HashMismatch {
                    artifact: format!("asset index {}", reference.id),
                    algorithm: HashAlgorithm::Sha1,
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        let index: AssetIndex = serde_json::from_slice(&raw)?;
        Ok((index, raw))
    }

    /// Write the raw index to `path` so verify can run without a re-fetch.
    pub async fn persist(raw: &[u8], path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }
        tokio::fs::write(path, raw)
            .await
            .map_err(|e| LauncherError::io(path, e))?;
        debug!("Cached asset index at {:?}", path);
        Ok(())
    }

    /// `Ok(None)` when no index has been cached yet.
    pub async fn load_cached(path: &Path) -> LauncherResult<Option<Self>> {
        match tokio::fs::read(path).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LauncherError::io(path, e)),
        }
    }

    /// One fetch item per object, named by logical path.
    pub fn fetch_items(
        &self,
        objects_dir: &Path,
        resources_base: &str,
    ) -> LauncherResult<Vec<FetchItem>> {
        self.objects
            .iter()
            .map(|(name, object)| {
                Ok(FetchItem {
                    name: name.clone(),
                    url: object.url(resources_base)?,
                    dest: object.object_path(objects_dir)?,
                    hash: object.hash.clone(),
                })
            })
            .collect()
    }
}
