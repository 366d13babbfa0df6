// ─── Version File ───
// Typed form of a per-version JSON. Upstream entries do not all carry every
// block, so everything past `id` is optional or defaulted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rules::{is_active, HostPlatform, Rule};
use crate::core::error::{LauncherError, LauncherResult};

/// A fully parsed Mojang version JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    pub id: String,
    #[serde(default, rename = "type")]
    pub version_type: Option<String>,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub arguments: Arguments,
    /// Pre-1.13 game arguments as one space-separated template string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minecraft_arguments: Option<String>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexRef>,
    #[serde(default)]
    pub assets: Option<String>,
    #[serde(default)]
    pub downloads: HashMap<String, DownloadArtifact>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default)]
    pub java_version: Option<JavaVersionInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    pub major_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DownloadArtifact {
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total_size: Option<u64>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub client: Option<LoggingClient>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingClient {
    /// JVM argument template, e.g. `-Dlog4j.configurationFile=${path}`.
    pub argument: String,
    pub file: LoggingFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingFile {
    pub id: String,
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<ArgumentEntry>,
    #[serde(default)]
    pub jvm: Vec<ArgumentEntry>,
}

/// One element of an argument template list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentEntry {
    Literal(String),
    Conditional {
        #[serde(default)]
        rules: Vec<Rule>,
        value: ArgumentValue,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Single(String),
    Many(Vec<String>),
}

impl ArgumentValue {
    pub fn as_slice(&self) -> &[String] {
        match self {
            ArgumentValue::Single(value) => std::slice::from_ref(value),
            ArgumentValue::Many(values) => values,
        }
    }
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibraryArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryArtifact {
    pub path: String,
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
}

impl LibraryEntry {
    pub fn is_required(&self, host: &HostPlatform) -> bool {
        is_active(&self.rules, host)
    }

    pub fn artifact(&self) -> Option<&LibraryArtifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    /// Where the artifact lives under `libraries_dir`, if it has one.
    pub fn local_path(&self, libraries_dir: &Path) -> Option<PathBuf> {
        self.artifact().map(|a| libraries_dir.join(&a.path))
    }
}

impl VersionDescriptor {
    /// Libraries whose rules all pass on `host`, in declaration order.
    pub fn required_libraries(&self, host: &HostPlatform) -> Vec<&LibraryEntry> {
        self.libraries
            .iter()
            .filter(|lib| lib.is_required(host))
            .collect()
    }

    pub fn client_download(&self) -> Option<&DownloadArtifact> {
        self.downloads.get("client")
    }

    pub fn logging_client(&self) -> Option<&LoggingClient> {
        self.logging.as_ref()?.client.as_ref()
    }

    /// Legacy `minecraftArguments` split into literal templates. Empty when
    /// structured game arguments exist.
    pub fn legacy_game_arguments(&self) -> Vec<ArgumentEntry> {
        match &self.minecraft_arguments {
            Some(line) if self.arguments.game.is_empty() => line
                .split_whitespace()
                .map(|token| ArgumentEntry::Literal(token.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn asset_index_id(&self) -> Option<&str> {
        self.asset_index
            .as_ref()
            .map(|i| i.id.as_str())
            .or(self.assets.as_deref())
    }

    /// Write the descriptor as `versions/<id>/<id>.json`-style profile config.
    pub async fn save_to(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| LauncherError::io(path, e))?;
        debug!("Saved version descriptor {} to {:?}", self.id, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::rules::RuleAction;

    fn linux() -> HostPlatform {
        HostPlatform::new("linux", "x86_64")
    }

    #[test]
    fn parses_mixed_argument_templates() {
        let parsed: VersionDescriptor = serde_json::from_value(serde_json::json!({
            "id": "1.19.2",
            "mainClass": "net.minecraft.client.main.Main",
            "arguments": {
                "game": [
                    "--username",
                    "${auth_player_name}",
                    {
                        "rules": [{"action": "allow", "features": {"is_demo_user": true}}],
                        "value": "--demo"
                    }
                ],
                "jvm": [
                    {
                        "rules": [{"action": "allow", "os": {"name": "osx"}}],
                        "value": ["-XstartOnFirstThread"]
                    },
                    "-cp",
                    "${classpath}"
                ]
            }
        }))
        .unwrap();

        assert_eq!(parsed.arguments.game.len(), 3);
        assert_eq!(
            parsed.arguments.game[0],
            ArgumentEntry::Literal("--username".into())
        );
        match &parsed.arguments.jvm[0] {
            ArgumentEntry::Conditional { rules, value } => {
                assert_eq!(rules[0].action, RuleAction::Allow);
                assert_eq!(value.as_slice(), ["-XstartOnFirstThread".to_string()]);
            }
            other => panic!("expected conditional, got {:?}", other),
        }
        match &parsed.arguments.game[2] {
            ArgumentEntry::Conditional { value, .. } => {
                assert_eq!(value.as_slice(), ["--demo".to_string()]);
            }
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn tolerates_sparse_descriptors() {
        let parsed: VersionDescriptor =
            serde_json::from_value(serde_json::json!({ "id": "old" })).unwrap();
        assert!(parsed.main_class.is_none());
        assert!(parsed.logging_client().is_none());
        assert!(parsed.client_download().is_none());
        assert!(parsed.asset_index_id().is_none());
        assert!(parsed.libraries.is_empty());
    }

    #[test]
    fn full_schema_blocks_are_exposed() {
        let parsed: VersionDescriptor = serde_json::from_value(serde_json::json!({
            "id": "1.20",
            "assetIndex": {"id": "5", "sha1": "abc", "size": 1, "totalSize": 2, "url": "https://x/5.json"},
            "downloads": {"client": {"sha1": "c1", "size": 3, "url": "https://x/client.jar"}},
            "logging": {"client": {
                "argument": "-Dlog4j.configurationFile=${path}",
                "file": {"id": "client-1.12.xml", "sha1": "l1", "size": 4, "url": "https://x/log.xml"},
                "type": "log4j2-xml"
            }},
            "javaVersion": {"component": "java-runtime-gamma", "majorVersion": 17}
        }))
        .unwrap();

        assert_eq!(parsed.asset_index_id(), Some("5"));
        assert_eq!(parsed.client_download().map(|d| d.sha1.as_str()), Some("c1"));
        assert_eq!(
            parsed.logging_client().map(|l| l.file.id.as_str()),
            Some("client-1.12.xml")
        );
        assert_eq!(parsed.java_version.map(|j| j.major_version), Some(17));
    }

    #[test]
    fn legacy_argument_string_is_split_into_literals() {
        let parsed: VersionDescriptor = serde_json::from_value(serde_json::json!({
            "id": "1.12.2",
            "minecraftArguments": "--username ${auth_player_name}  --version ${version_name}"
        }))
        .unwrap();

        assert_eq!(
            parsed.legacy_game_arguments(),
            vec![
                ArgumentEntry::Literal("--username".into()),
                ArgumentEntry::Literal("${auth_player_name}".into()),
                ArgumentEntry::Literal("--version".into()),
                ArgumentEntry::Literal("${version_name}".into()),
            ]
        );

        let saved = serde_json::to_value(&parsed).unwrap();
        assert_eq!(saved["minecraftArguments"], parsed.minecraft_arguments.unwrap().as_str());
    }

    #[test]
    fn structured_arguments_win_over_legacy_string() {
        let parsed: VersionDescriptor = serde_json::from_value(serde_json::json!({
            "id": "hybrid",
            "arguments": {"game": ["--demo"]},
            "minecraftArguments": "--username ${auth_player_name}"
        }))
        .unwrap();
        assert!(parsed.legacy_game_arguments().is_empty());
    }

    #[test]
    fn required_libraries_follow_host_rules() {
        let parsed: VersionDescriptor = serde_json::from_value(serde_json::json!({
            "id": "1.20",
            "libraries": [
                {"name": "a:common:1"},
                {"name": "a:linux-only:1", "rules": [{"action": "allow", "os": {"name": "linux"}}]},
                {"name": "a:mac-only:1", "rules": [{"action": "allow", "os": {"name": "osx"}}]}
            ]
        }))
        .unwrap();

        let names: Vec<&str> = parsed
            .required_libraries(&linux())
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["a:common:1", "a:linux-only:1"]);
    }

    #[test]
    fn library_local_path_uses_declared_artifact_path() {
        let lib: LibraryEntry = serde_json::from_value(serde_json::json!({
            "name": "com.mojang:brigadier:1.0.18",
            "downloads": {"artifact": {
                "path": "com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar",
                "sha1": "c1ef1234", "size": 77392,
                "url": "https://libraries.minecraft.net/com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar"
            }}
        }))
        .unwrap();

        assert_eq!(
            lib.local_path(Path::new("/libs")),
            Some(PathBuf::from("/libs/com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar"))
        );
    }
}
