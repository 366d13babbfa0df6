// ─── Profile Manager ───
// Discovers installed profiles, verifies their files and launches them.

use std::collections::HashMap;
use std::process::ExitStatus;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::model::{ClientSettings, InstalledProfile};
use crate::core::assets::AssetIndex;
use crate::core::auth::LaunchAuth;
use crate::core::cancel::CancelToken;
use crate::core::config::LauncherConfig;
use crate::core::downloader::ContentFetcher;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::ProgressBus;
use crate::core::http::HttpTransport;
use crate::core::install::{library_items, logging_item};
use crate::core::java;
use crate::core::launch::{
    run_java, ArgumentQuoting, CommandLine, CommandLineBuilder, LaunchPlaceholders,
    PlaceholderKey, RuntimeOptions,
};
use crate::core::loaders::FabricProfile;
use crate::core::paths::LauncherPaths;
use crate::core::system;
use crate::core::version::{HostPlatform, ManifestClient, VersionDescriptor};

pub struct ProfileManager {
    config: LauncherConfig,
    paths: LauncherPaths,
    host: HostPlatform,
    manifests: ManifestClient,
    fetcher: ContentFetcher,
    bus: Arc<ProgressBus>,
}

impl ProfileManager {
    pub fn new(
        config: LauncherConfig,
        transport: Arc<dyn HttpTransport>,
        bus: Arc<ProgressBus>,
    ) -> Self {
        let paths = config.paths();
        let manifests = ManifestClient::new(transport.clone(), &config.endpoints.version_manifest);
        let fetcher = ContentFetcher::new(transport, config.downloads.hash);
        Self {
            config,
            paths,
            host: HostPlatform::current(),
            manifests,
            fetcher,
            bus,
        }
    }

    pub fn with_host(mut self, host: HostPlatform) -> Self {
        self.host = host;
        self
    }

    // ── Discovery ───────────────────────────────────────

    /// Every `versions/<name>/` holding a `<name>.json`. Mod loader profiles
    /// resolve their parent version through the manifest.
    pub async fn discover(&self) -> LauncherResult<Vec<InstalledProfile>> {
        let mut parents: HashMap<String, VersionDescriptor> = HashMap::new();
        let mut profiles = Vec::new();

        for name in self.paths.profile_names().await? {
            let config_path = self.paths.profile_config(&name);
            let raw = match tokio::fs::read(&config_path).await {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Skipping {}: no {:?}", name, config_path);
                    continue;
                }
                Err(e) => return Err(LauncherError::io(&config_path, e)),
            };

            let loader: FabricProfile = match serde_json::from_slice(&raw) {
                Ok(loader) => loader,
                Err(e) => {
                    warn!("Skipping {}: unreadable {:?}: {}", name, config_path, e);
                    continue;
                }
            };
            let (version, loader) = match loader.inherits_from.clone() {
                Some(parent) => {
                    let version = match parents.get(&parent) {
                        Some(version) => version.clone(),
                        None => {
                            let version = self.manifests.fetch_version(&parent).await?;
                            parents.insert(parent, version.clone());
                            version
                        }
                    };
                    (version, Some(loader))
                }
                None => match serde_json::from_slice::<VersionDescriptor>(&raw) {
                    Ok(version) => (version, None),
                    Err(e) => {
                        warn!("Skipping {}: not a version descriptor: {}", name, e);
                        continue;
                    }
                },
            };

            profiles.push(self.build_profile(name, version, loader).await?);
        }

        info!("Discovered {} installed profile(s)", profiles.len());
        Ok(profiles)
    }

    /// The profile to act on: a mod loader profile when the loader is
    /// enabled, else the one named after the pinned version.
    pub async fn find_profile(&self) -> LauncherResult<InstalledProfile> {
        let want_loader = self.config.mod_loader.enabled;
        let game_version = self.config.game_version.as_str();
        self.discover()
            .await?
            .into_iter()
            .max_by_key(|p| (p.is_modded() == want_loader, p.version.id == game_version))
            .ok_or_else(|| LauncherError::ProfileNotFound(self.paths.versions_dir()))
    }

    async fn build_profile(
        &self,
        name: String,
        version: VersionDescriptor,
        loader: Option<FabricProfile>,
    ) -> LauncherResult<InstalledProfile> {
        let required_assets = match version.asset_index_id() {
            Some(id) => AssetIndex::load_cached(&self.paths.asset_index_file(id)).await?,
            None => None,
        };
        let log_cfg_path = logging_item(&version, &self.paths).map(|item| item.dest);
        let required_libraries = library_items(&version, &self.host, &self.paths.libraries_dir());

        Ok(InstalledProfile {
            jar_path: self.paths.profile_jar(&name),
            name,
            version,
            loader,
            log_cfg_path,
            required_assets,
            required_libraries,
        })
    }

    // ── Verification ────────────────────────────────────

    /// Names of every required file that is missing or fails its hash.
    pub async fn verify(&self, profile: &InstalledProfile) -> LauncherResult<Vec<String>> {
        let mut missing = Vec::new();

        match (&profile.required_assets, profile.version.asset_index_id()) {
            (Some(index), _) => {
                let objects_dir = self.paths.objects_dir();
                for (name, object) in &index.objects {
                    let present = match object.object_path(&objects_dir) {
                        Ok(path) => self.fetcher.matches(&path, &object.hash).await,
                        Err(_) => false,
                    };
                    if !present {
                        missing.push(name.clone());
                    }
                }
            }
            (None, Some(id)) => missing.push(format!("assets/indexes/{}.json", id)),
            (None, None) => {}
        }

        for item in &profile.required_libraries {
            if !self.fetcher.matches(&item.dest, &item.hash).await {
                missing.push(item.name.clone());
            }
        }

        if let Some(item) = logging_item(&profile.version, &self.paths) {
            if !self.fetcher.matches(&item.dest, &item.hash).await {
                missing.push(format!("assets/log_cfgs/{}", item.name));
            }
        }

        if let Some(client) = profile.version.client_download() {
            if !self.fetcher.matches(&profile.jar_path, &client.sha1).await {
                missing.push(format!("versions/{0}/{0}.jar", profile.name));
            }
        }

        if missing.is_empty() {
            debug!("Profile {} verified", profile.name);
        } else {
            warn!(
                "Profile {} has {} missing or corrupt file(s)",
                profile.name,
                missing.len()
            );
        }
        Ok(missing)
    }

    // ── Launch ──────────────────────────────────────────

    /// The game's argv (main class included) for this profile and session.
    pub fn command_line(
        &self,
        profile: &InstalledProfile,
        auth: &LaunchAuth,
        settings: &ClientSettings,
    ) -> LauncherResult<(String, CommandLine)> {
        let main_class = profile
            .main_class()
            .ok_or_else(|| LauncherError::MissingField {
                context: format!("profile {}", profile.name),
                field: "mainClass".into(),
            })?
            .to_string();

        let libraries_dir = self.paths.libraries_dir();
        let mut placeholders = LaunchPlaceholders::new()
            .with(PlaceholderKey::NativesDirectory, ".")
            .with(PlaceholderKey::LauncherName, &self.config.launcher_name)
            .with(PlaceholderKey::LauncherVersion, &self.config.launcher_version)
            .with(PlaceholderKey::AuthPlayerName, &auth.username)
            // The game version, also for mod loader profiles.
            .with(PlaceholderKey::VersionName, &profile.version.id)
            .with(
                PlaceholderKey::GameDirectory,
                self.paths.root().to_string_lossy(),
            )
            .with(
                PlaceholderKey::AssetsRoot,
                self.paths.assets_dir().to_string_lossy(),
            )
            .with(PlaceholderKey::AuthUuid, &auth.uuid)
            .with(PlaceholderKey::AuthAccessToken, &auth.access_token)
            .with(PlaceholderKey::UserType, "msa")
            .with(PlaceholderKey::VersionType, "release")
            .with(
                PlaceholderKey::LibraryDirectory,
                libraries_dir.to_string_lossy(),
            );
        if let Some(index) = profile.version.asset_index_id() {
            placeholders.set(PlaceholderKey::AssetsIndexName, index);
        }
        if let Some(path) = &profile.log_cfg_path {
            placeholders.set(PlaceholderKey::Path, path.to_string_lossy());
        }

        let options = RuntimeOptions {
            max_memory_mb: settings.memory,
            width: settings.width,
            height: settings.height,
            mod_loader: profile.is_modded(),
            // Arguments go straight to the child, no shell in between.
            quoting: ArgumentQuoting::Verbatim,
        };
        let command = CommandLineBuilder::new(
            &profile.version,
            &self.host,
            &libraries_dir,
            &profile.jar_path,
        )
        .build(
            &placeholders,
            &profile.extra_classpath(&libraries_dir),
            &settings.extra_jvm_args(),
            &options,
        );
        Ok((main_class, command))
    }

    /// Verify, then run the game until it exits.
    pub async fn launch(
        &self,
        profile: &InstalledProfile,
        auth: &LaunchAuth,
        settings: &ClientSettings,
        cancel: &CancelToken,
    ) -> LauncherResult<ExitStatus> {
        self.bus.begin("Verifying game files");
        let missing = self.verify(profile).await?;
        if !missing.is_empty() {
            for name in &missing {
                warn!("Missing or corrupt: {}", name);
            }
            return Err(LauncherError::FilesNeedReinstall(missing));
        }

        let java_bin = java::resolve_java_binary(self.config.java_path.as_deref(), &self.paths);
        if let Some(required) = &profile.version.java_version {
            java::ensure_major(&java_bin, required.major_version).await?;
        }

        let total_mb = system::total_memory_mb();
        if total_mb > 0 && u64::from(settings.memory) > total_mb {
            warn!(
                "Requested {} MB of heap but the machine has {} MB",
                settings.memory, total_mb
            );
        }

        let (main_class, command) = self.command_line(profile, auth, settings)?;
        let argv = command.argv(&main_class);

        self.bus.emit(50.0, "Launching game");
        info!("Launching {} as {}", profile.name, auth.username);
        self.bus.emit(60.0, "Game running");
        let status = run_java(
            &java_bin,
            &argv,
            self.paths.root(),
            &[auth.access_token.as_str()],
            cancel,
        )
        .await?;

        self.bus.emit(100.0, "Game exited");
        info!("Game exited with {}", status);
        Ok(status)
    }
}
