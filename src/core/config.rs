// ─── Launcher Config ───
// Every upstream URL and tunable lives here; nothing is a global.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::downloader::HashAlgorithm;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::paths::{default_root_dir, LauncherPaths};

pub const CONFIG_FILE: &str = "launcher.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Install root; `None` means the platform default.
    pub root_dir: Option<PathBuf>,
    /// The single game version this launcher installs.
    pub game_version: String,
    pub mod_loader: ModLoaderConfig,
    pub endpoints: Endpoints,
    pub downloads: DownloadConfig,
    pub auth: AuthConfig,
    pub java_path: Option<PathBuf>,
    pub launcher_name: String,
    pub launcher_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModLoaderConfig {
    pub enabled: bool,
    pub installer_url: String,
    /// Minimum Java version the installer subprocess needs.
    pub minimum_java: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub version_manifest: String,
    /// Assets are fetched from `<resources_base>/<hash[0:2]>/<hash>`.
    pub resources_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub hash: HashAlgorithm,
    /// Extra attempts per file after a connection error, 5xx or 429.
    pub retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub client_id: String,
    pub scope: String,
    pub device_code_url: String,
    pub token_url: String,
    pub xbox_user_auth_url: String,
    pub xsts_authorize_url: String,
    pub game_login_url: String,
    pub profile_url: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            game_version: "1.19.2".into(),
            mod_loader: ModLoaderConfig::default(),
            endpoints: Endpoints::default(),
            downloads: DownloadConfig::default(),
            auth: AuthConfig::default(),
            java_path: None,
            launcher_name: "Genecraft Launcher".into(),
            launcher_version: "1.0".into(),
        }
    }
}

impl Default for ModLoaderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            installer_url: "https://maven.fabricmc.net/net/fabricmc/fabric-installer/0.11.0/fabric-installer-0.11.0.jar".into(),
            minimum_java: "17.0.0".into(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            version_manifest: "https://launchermeta.mojang.com/mc/game/version_manifest.json".into(),
            resources_base: "https://resources.download.minecraft.net".into(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout_secs: 60,
            hash: HashAlgorithm::Sha1,
            retries: 2,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: "048f6903-f7d2-47b7-8d7d-47a2fa08b0f7".into(),
            scope: "XboxLive.signin offline_access".into(),
            device_code_url: "https://login.microsoftonline.com/consumers/oauth2/v2.0/devicecode".into(),
            token_url: "https://login.microsoftonline.com/consumers/oauth2/v2.0/token".into(),
            xbox_user_auth_url: "https://user.auth.xboxlive.com/user/authenticate".into(),
            xsts_authorize_url: "https://xsts.auth.xboxlive.com/xsts/authorize".into(),
            game_login_url: "https://api.minecraftservices.com/authentication/login_with_xbox".into(),
            profile_url: "https://api.minecraftservices.com/minecraft/profile".into(),
        }
    }
}

impl LauncherConfig {
    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> LauncherResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                let config: LauncherConfig = serde_json::from_str(&raw)?;
                info!("Loaded launcher config from {:?}", path);
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No launcher config at {:?}, using defaults", path);
                Ok(Self::default())
            }
            Err(e) => Err(LauncherError::io(path, e)),
        }
    }

    /// Where the config is looked up when no explicit path is given.
    pub fn default_path() -> PathBuf {
        default_root_dir().join(CONFIG_FILE)
    }

    pub fn root_dir(&self) -> PathBuf {
        self.root_dir.clone().unwrap_or_else(default_root_dir)
    }

    pub fn paths(&self) -> LauncherPaths {
        LauncherPaths::new(self.root_dir())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.downloads.timeout_secs.max(1))
    }
}
