use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::paths::LauncherPaths;

#[derive(Debug, Clone, Serialize)]
pub struct JavaInstallation {
    pub path: PathBuf,
    pub version: String,
    pub major: u32,
}

/// Configured override, then the bundled runtime under the root, then `java`
/// from `PATH`.
pub fn resolve_java_binary(configured: Option<&Path>, paths: &LauncherPaths) -> PathBuf {
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    let embedded = paths.embedded_java_path();
    if embedded.is_file() {
        return embedded;
    }
    PathBuf::from(java_exe())
}

/// Run `<java> -version` and parse what it reports.
#[instrument]
pub async fn probe_java(path: &Path) -> LauncherResult<JavaInstallation> {
    let output = Command::new(path)
        .arg("-version")
        .output()
        .await
        .map_err(|e| LauncherError::JavaNotFound(format!("{}: {}", path.display(), e)))?;

    // `-version` prints to stderr; some builds use stdout.
    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
    debug!("Probing {:?}: {}", path, text.lines().next().unwrap_or(""));

    let version = parse_version_output(&text).ok_or_else(|| {
        LauncherError::JavaNotFound(format!(
            "{} did not report a version",
            path.display()
        ))
    })?;

    Ok(JavaInstallation {
        path: path.to_path_buf(),
        major: parse_major_version(&version),
        version,
    })
}

/// Probe `java_bin` and require at least `required` (e.g. `"17.0.0"`).
pub async fn ensure_minimum(java_bin: &Path, required: &str) -> LauncherResult<JavaInstallation> {
    let installation = probe_java(java_bin).await?;
    if compare_java_versions(&installation.version, required) == Ordering::Less {
        return Err(LauncherError::UnsupportedRuntime {
            required: required.to_string(),
            found: installation.version,
        });
    }
    info!(
        "Using Java {} at {:?}",
        installation.version, installation.path
    );
    Ok(installation)
}

/// Require a major version, as declared by a version's `javaVersion`.
pub async fn ensure_major(java_bin: &Path, required_major: u32) -> LauncherResult<JavaInstallation> {
    ensure_minimum(java_bin, &required_major.to_string()).await
}

/// Quoted version (`openjdk version "17.0.8" ...`) or, failing that, the
/// second word of the first line (`openjdk 17.0.2 2022-01-18`).
pub fn parse_version_output(output: &str) -> Option<String> {
    for line in output.lines() {
        if let Some(start) = line.find('"') {
            if let Some(end) = line[start + 1..].find('"') {
                return Some(line[start + 1..start + 1 + end].to_string());
            }
        }
    }
    let first = output.lines().find(|l| !l.trim().is_empty())?;
    let word = first.split_whitespace().nth(1)?;
    word.starts_with(|c: char| c.is_ascii_digit())
        .then(|| word.to_string())
}

pub fn parse_major_version(version: &str) -> u32 {
    parse_java_version(version).0
}

/// `(major, minor, patch)`. Legacy `1.x` versions map to `x`
/// (`1.8.0_392` → `(8, 0, 392)`).
pub fn parse_java_version(version: &str) -> (u32, u32, u32) {
    let cleaned = version
        .split(|c| c == '-' || c == '+' || c == ' ')
        .next()
        .unwrap_or(version);
    let cleaned = cleaned.strip_prefix("1.").unwrap_or(cleaned);

    let mut nums = cleaned
        .split(|c| c == '.' || c == '_')
        .map(|part| part.parse::<u32>().unwrap_or(0));
    (
        nums.next().unwrap_or(0),
        nums.next().unwrap_or(0),
        nums.next().unwrap_or(0),
    )
}

pub fn compare_java_versions(left: &str, right: &str) -> Ordering {
    parse_java_version(left).cmp(&parse_java_version(right))
}

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}
