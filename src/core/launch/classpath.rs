// ─── Classpath ───

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::version::{HostPlatform, VersionDescriptor};

/// Required libraries, then caller extras, then the game jar; joined with the
/// host separator. Duplicates keep their first position. Pure; the
/// filesystem is never consulted.
pub fn build_classpath(
    version: &VersionDescriptor,
    host: &HostPlatform,
    libraries_dir: &Path,
    extras: &[PathBuf],
    game_jar: &Path,
) -> String {
    let mut entries: Vec<String> = version
        .required_libraries(host)
        .into_iter()
        .filter_map(|lib| lib.local_path(libraries_dir))
        .chain(extras.iter().cloned())
        .chain(std::iter::once(game_jar.to_path_buf()))
        .map(|p| p.to_string_lossy().to_string())
        .collect();

    dedup_preserving_order(&mut entries, host);
    entries.join(host.classpath_separator())
}

fn dedup_preserving_order(entries: &mut Vec<String>, host: &HostPlatform) {
    let mut seen = HashSet::new();
    entries.retain(|entry| {
        let key = if host.is_windows() {
            entry.to_lowercase()
        } else {
            entry.clone()
        };
        seen.insert(key)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version() -> VersionDescriptor {
        serde_json::from_value(serde_json::json!({
            "id": "1.20",
            "libraries": [
                {"name": "a:one:1", "downloads": {"artifact": {"path": "a/one/1/one-1.jar", "sha1": "x", "url": "u"}}},
                {"name": "a:mac:1", "rules": [{"action": "allow", "os": {"name": "osx"}}],
                 "downloads": {"artifact": {"path": "a/mac/1/mac-1.jar", "sha1": "x", "url": "u"}}},
                {"name": "a:natives-only:1"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn orders_libraries_extras_then_jar() {
        let host = HostPlatform::new("linux", "x86_64");
        let cp = build_classpath(
            &version(),
            &host,
            Path::new("/libs"),
            &[PathBuf::from("/libs/net/fabricmc/x.jar"), PathBuf::from("/libs/a/one/1/one-1.jar")],
            Path::new("/root/versions/p/p.jar"),
        );
        assert_eq!(
            cp,
            "/libs/a/one/1/one-1.jar:/libs/net/fabricmc/x.jar:/root/versions/p/p.jar"
        );
    }

    #[test]
    fn windows_uses_semicolons() {
        let host = HostPlatform::new("windows", "x86_64");
        let cp = build_classpath(&version(), &host, Path::new("L"), &[], Path::new("g.jar"));
        assert_eq!(cp.matches(';').count(), 1);
    }
}
