use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::assets::AssetIndex;
use crate::core::downloader::FetchItem;
use crate::core::loaders::FabricProfile;
use crate::core::version::VersionDescriptor;

/// A game profile found under `versions/<name>/`.
///
/// `loader` is set when the profile config is a mod loader manifest that
/// inherits from `version`; plain profiles carry the descriptor itself.
#[derive(Debug)]
pub struct InstalledProfile {
    pub name: String,
    pub jar_path: PathBuf,
    pub version: VersionDescriptor,
    pub loader: Option<FabricProfile>,
    /// `assets/log_cfgs/<id>` when the version declares a logging config.
    pub log_cfg_path: Option<PathBuf>,
    /// `None` until the asset index has been cached by an install.
    pub required_assets: Option<AssetIndex>,
    pub required_libraries: Vec<FetchItem>,
}

impl InstalledProfile {
    pub fn main_class(&self) -> Option<&str> {
        self.loader
            .as_ref()
            .and_then(|l| l.main_class.as_deref())
            .or(self.version.main_class.as_deref())
    }

    pub fn is_modded(&self) -> bool {
        self.loader.is_some()
    }

    /// Mod loader jars to put ahead of the game jar on the classpath.
    pub fn extra_classpath(&self, libraries_dir: &Path) -> Vec<PathBuf> {
        self.loader
            .as_ref()
            .map(|l| l.classpath_entries(libraries_dir))
            .unwrap_or_default()
    }
}

/// Per-launch client options. Supplied by the caller; never persisted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Max heap in MB; 0 leaves it to the JVM.
    pub memory: u32,
    pub width: u32,
    pub height: u32,
    /// Whitespace-separated extra JVM arguments.
    pub jvm_args: String,
}

impl ClientSettings {
    pub fn extra_jvm_args(&self) -> Vec<String> {
        self.jvm_args
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_jvm_args_ignore_repeated_spaces() {
        let settings = ClientSettings {
            jvm_args: "  -XX:+UseG1GC   -Dfoo=bar ".into(),
            ..ClientSettings::default()
        };
        assert_eq!(settings.extra_jvm_args(), vec!["-XX:+UseG1GC", "-Dfoo=bar"]);
        assert!(ClientSettings::default().extra_jvm_args().is_empty());
    }

    #[test]
    fn settings_decode_from_partial_json() {
        let settings: ClientSettings =
            serde_json::from_str(r#"{"memory": 3000, "jvm_args": "-Dx=1"}"#).unwrap();
        assert_eq!(settings.memory, 3000);
        assert_eq!(settings.width, 0);
    }
}
