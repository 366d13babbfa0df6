use std::path::Path;

use tracing::debug;

use crate::core::downloader::FetchItem;
use crate::core::paths::LauncherPaths;
use crate::core::version::{HostPlatform, VersionDescriptor};

/// Every library the host needs, as fetch items named by coordinate.
/// Libraries without a downloadable artifact are skipped.
pub fn library_items(
    version: &VersionDescriptor,
    host: &HostPlatform,
    libraries_dir: &Path,
) -> Vec<FetchItem> {
    version
        .required_libraries(host)
        .into_iter()
        .filter_map(|lib| {
            let Some(artifact) = lib.artifact() else {
                debug!("Library {} has no artifact, skipping", lib.name);
                return None;
            };
            Some(FetchItem {
                name: lib.name.clone(),
                url: artifact.url.clone(),
                dest: libraries_dir.join(&artifact.path),
                hash: artifact.sha1.clone(),
            })
        })
        .collect()
}

/// The version's logging configuration, stored under `assets/log_cfgs/`.
pub fn logging_item(version: &VersionDescriptor, paths: &LauncherPaths) -> Option<FetchItem> {
    let file = &version.logging_client()?.file;
    Some(FetchItem {
        name: file.id.clone(),
        url: file.url.clone(),
        dest: paths.log_configs_dir().join(&file.id),
        hash: file.sha1.clone(),
    })
}

/// The client jar for the profile called `profile_name`.
pub fn client_item(
    version: &VersionDescriptor,
    paths: &LauncherPaths,
    profile_name: &str,
) -> Option<FetchItem> {
    let client = version.client_download()?;
    let dest = paths.profile_jar(profile_name);
    Some(FetchItem {
        name: format!("versions/{0}/{0}.jar", profile_name),
        url: client.url.clone(),
        dest,
        hash: client.sha1.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version() -> VersionDescriptor {
        serde_json::from_value(serde_json::json!({
            "id": "1.19.2",
            "downloads": {"client": {"sha1": "c0", "size": 1, "url": "https://piston.test/client.jar"}},
            "logging": {"client": {
                "argument": "-Dlog4j.configurationFile=${path}",
                "file": {"id": "client-1.12.xml", "sha1": "l0", "size": 1, "url": "https://piston.test/client-1.12.xml"},
                "type": "log4j2-xml"
            }},
            "libraries": [
                {"name": "com.mojang:blocklist:1.0.10", "downloads": {"artifact": {
                    "path": "com/mojang/blocklist/1.0.10/blocklist-1.0.10.jar",
                    "sha1": "b0", "size": 1, "url": "https://libraries.test/blocklist.jar"}}},
                {"name": "org.lwjgl:lwjgl:3.3.1:natives-windows", "downloads": {"artifact": {
                    "path": "org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-windows.jar",
                    "sha1": "w0", "size": 1, "url": "https://libraries.test/lwjgl-win.jar"}},
                 "rules": [{"action": "allow", "os": {"name": "windows"}}]},
                {"name": "org.example:no-artifact:1.0"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn library_items_follow_host_rules() {
        let items = library_items(
            &version(),
            &HostPlatform::new("linux", "x86_64"),
            Path::new("/libs"),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "com.mojang:blocklist:1.0.10");
        assert_eq!(
            items[0].dest,
            Path::new("/libs/com/mojang/blocklist/1.0.10/blocklist-1.0.10.jar")
        );

        let windows = library_items(
            &version(),
            &HostPlatform::new("windows", "x86_64"),
            Path::new("/libs"),
        );
        assert_eq!(windows.len(), 2);
    }

    #[test]
    fn logging_and_client_items_land_in_launcher_layout() {
        let paths = LauncherPaths::new("/root/.genecraft");
        let logging = logging_item(&version(), &paths).unwrap();
        assert_eq!(
            logging.dest,
            Path::new("/root/.genecraft/assets/log_cfgs/client-1.12.xml")
        );

        let client = client_item(&version(), &paths, "fabric-loader-0.14.21-1.19.2").unwrap();
        assert_eq!(
            client.dest,
            paths.profile_jar("fabric-loader-0.14.21-1.19.2")
        );
    }
}
