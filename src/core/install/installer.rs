// ─── Profile Installer ───
// Populates the install root: mod loader, version metadata, logging config,
// asset index, assets, libraries, client jar. Progress goes to the bus.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::plan::{client_item, library_items, logging_item};
use crate::core::assets::AssetIndex;
use crate::core::cancel::CancelToken;
use crate::core::config::LauncherConfig;
use crate::core::downloader::{BatchReport, ContentFetcher, FetchItem, HashAlgorithm};
use crate::core::error::{LauncherError, LauncherResult, ResultExt};
use crate::core::events::ProgressBus;
use crate::core::http::HttpTransport;
use crate::core::java;
use crate::core::loaders::FabricInstaller;
use crate::core::paths::LauncherPaths;
use crate::core::version::{AssetIndexRef, HostPlatform, ManifestClient, VersionDescriptor};

const ASSETS_START: f64 = 15.0;
const LIBRARIES_START: f64 = 55.0;
const CLIENT_START: f64 = 90.0;
const CLIENT_END: f64 = 99.0;

const RETRY_DELAY: Duration = Duration::from_millis(250);

/// What an install did. Only produced when every item is present.
#[derive(Debug, Default)]
pub struct InstallReport {
    pub version_id: String,
    pub profiles: Vec<String>,
    pub assets: BatchReport,
    pub libraries: BatchReport,
    pub client_jars: BatchReport,
}

impl InstallReport {
    pub fn downloaded(&self) -> usize {
        self.assets.downloaded + self.libraries.downloaded + self.client_jars.downloaded
    }

    pub fn skipped(&self) -> usize {
        self.assets.skipped + self.libraries.skipped + self.client_jars.skipped
    }

    fn failed_names(&self) -> Vec<String> {
        [&self.assets, &self.libraries, &self.client_jars]
            .into_iter()
            .flat_map(BatchReport::failed_names)
            .collect()
    }

    fn total(&self) -> usize {
        self.assets.total() + self.libraries.total() + self.client_jars.total()
    }
}

pub struct ProfileInstaller {
    config: LauncherConfig,
    paths: LauncherPaths,
    host: HostPlatform,
    transport: Arc<dyn HttpTransport>,
    manifests: ManifestClient,
    fetcher: ContentFetcher,
    loader: FabricInstaller,
    bus: Arc<ProgressBus>,
}

impl ProfileInstaller {
    pub fn new(
        config: LauncherConfig,
        transport: Arc<dyn HttpTransport>,
        bus: Arc<ProgressBus>,
    ) -> Self {
        let paths = config.paths();
        let manifests = ManifestClient::new(transport.clone(), &config.endpoints.version_manifest);
        let fetcher = ContentFetcher::new(transport.clone(), config.downloads.hash)
            .with_concurrency(config.downloads.concurrency)
            .with_retries(config.downloads.retries, RETRY_DELAY);
        let loader = FabricInstaller::new(
            transport.clone(),
            &config.mod_loader.installer_url,
            &config.mod_loader.minimum_java,
        );
        Self {
            config,
            paths,
            host: HostPlatform::current(),
            transport,
            manifests,
            fetcher,
            loader,
            bus,
        }
    }

    /// Evaluate library rules for `host` instead of the running machine.
    pub fn with_host(mut self, host: HostPlatform) -> Self {
        self.host = host;
        self
    }

    pub fn paths(&self) -> &LauncherPaths {
        &self.paths
    }

    /// Run the whole pipeline. Per-item failures don't stop the batches but
    /// make the result `InstallIncomplete`.
    pub async fn install_profile(&self, cancel: &CancelToken) -> LauncherResult<InstallReport> {
        let game_version = self.config.game_version.as_str();
        info!(
            "Installing Minecraft {} into {:?}",
            game_version,
            self.paths.root()
        );
        self.bus.begin("Starting installation");
        self.paths.ensure_layout().await?;

        // 1-2. Mod loader
        if self.config.mod_loader.enabled {
            self.bus.emit(1.0, "Downloading mod loader installer");
            let java_bin =
                java::resolve_java_binary(self.config.java_path.as_deref(), &self.paths);
            self.bus.emit(5.0, "Installing mod loader");
            self.loader
                .install(&java_bin, self.paths.root(), game_version, cancel)
                .await
                .stage("failed to install fabric")?;
        }
        cancel.check()?;

        // 3. Manifest and version
        self.bus.emit(10.0, "Fetching version manifest");
        let manifest = self
            .manifests
            .fetch_manifest()
            .await
            .stage("failed to fetch version manifest")?;
        let version = self
            .manifests
            .resolve_version(&manifest, game_version)
            .await
            .stage("failed to resolve version")?;

        if !self.config.mod_loader.enabled {
            version
                .save_to(&self.paths.profile_config(&version.id))
                .await
                .stage("failed to write version profile")?;
        }

        // 4. Logging config
        if let Some(item) = logging_item(&version, &self.paths) {
            self.bus.emit(12.0, "Downloading logging configuration");
            self.fetcher
                .fetch(&item.url, &item.dest, &item.hash)
                .await
                .into_result()
                .stage("failed to download logging configuration")?;
        }
        cancel.check()?;

        let mut report = InstallReport {
            version_id: version.id.clone(),
            ..InstallReport::default()
        };

        // 5-6. Assets
        self.bus.emit(14.0, "Downloading asset index");
        match &version.asset_index {
            Some(reference) => {
                let index = self
                    .sync_asset_index(reference)
                    .await
                    .stage("failed to download asset index")?;
                let items = index
                    .fetch_items(&self.paths.objects_dir(), &self.config.endpoints.resources_base)
                    .stage("failed to download assets")?;
                report.assets = self
                    .fetch_batch("asset", items, ASSETS_START, LIBRARIES_START, cancel)
                    .await
                    .stage("failed to download assets")?;
            }
            None => warn!("Version {} declares no asset index", version.id),
        }

        // 6. Libraries
        let libraries = library_items(&version, &self.host, &self.paths.libraries_dir());
        report.libraries = self
            .fetch_batch("library", libraries, LIBRARIES_START, CLIENT_START, cancel)
            .await
            .stage("failed to download libraries")?;

        // Client jar into every discovered profile
        report.profiles = self.paths.profile_names().await?;
        let jars = self.client_jar_items(&version, &report.profiles);
        report.client_jars = self
            .fetch_batch("client jar", jars, CLIENT_START, CLIENT_END, cancel)
            .await
            .stage("failed to download game client")?;

        let failed = report.failed_names();
        if !failed.is_empty() {
            error!(
                "Installation incomplete, {} of {} items failed",
                failed.len(),
                report.total()
            );
            return Err(LauncherError::InstallIncomplete {
                failed,
                total: report.total(),
            });
        }

        self.bus.emit(100.0, "Installation complete");
        info!(
            "Install finished: {} downloaded, {} already present",
            report.downloaded(),
            report.skipped()
        );
        Ok(report)
    }

    /// Reuse the cached index when its SHA-1 still matches, else download
    /// and persist it.
    async fn sync_asset_index(&self, reference: &AssetIndexRef) -> LauncherResult<AssetIndex> {
        let path = self.paths.asset_index_file(&reference.id);

        if let Some(expected) = &reference.sha1 {
            if cached_matches(&path, expected).await {
                if let Some(index) = AssetIndex::load_cached(&path).await? {
                    debug!("Asset index {} is up to date", reference.id);
                    return Ok(index);
                }
            }
        }

        let (index, raw) = AssetIndex::fetch(self.transport.as_ref(), reference).await?;
        AssetIndex::persist(&raw, &path).await?;
        Ok(index)
    }

    fn client_jar_items(&self, version: &VersionDescriptor, profiles: &[String]) -> Vec<FetchItem> {
        if version.client_download().is_none() {
            warn!("Version {} declares no client download", version.id);
        }
        profiles
            .iter()
            .filter_map(|name| client_item(version, &self.paths, name))
            .collect()
    }

    async fn fetch_batch(
        &self,
        label: &str,
        items: Vec<FetchItem>,
        start: f64,
        end: f64,
        cancel: &CancelToken,
    ) -> LauncherResult<BatchReport> {
        let total = items.len();
        let mut done = 0usize;
        let bus = &self.bus;
        self.fetcher
            .fetch_all(items, cancel, |_, _| {
                done += 1;
                let pct = start + (end - start) * done as f64 / total as f64;
                bus.emit(pct, format!("Downloading {} {}/{}", label, done, total));
            })
            .await
    }
}

async fn cached_matches(path: &Path, expected: &str) -> bool {
    match tokio::fs::read(path).await {
        Ok(raw) => HashAlgorithm::Sha1
            .digest_hex(&raw)
            .eq_ignore_ascii_case(expected),
        Err(_) => false,
    }
}
