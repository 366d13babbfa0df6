use std::fmt;
use std::path::PathBuf;

use crate::core::error::{LauncherError, LauncherResult};

/// A parsed Maven coordinate, as used by library `name` fields.
///
/// Supported formats:
///   `groupId:artifactId:version`
///   `groupId:artifactId:version:classifier`
///   either of the above with an `@extension` suffix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension. Defaults to `"jar"`.
    pub extension: String,
}

impl MavenArtifact {
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        let invalid = || LauncherError::InvalidMavenCoordinate(coord.to_string());

        let (body, extension) = match coord.rsplit_once('@') {
            Some((body, ext)) if !ext.is_empty() => (body, ext),
            Some(_) => return Err(invalid()),
            None => (coord, "jar"),
        };

        let parts: Vec<&str> = body.split(':').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid());
        }

        let classifier = match parts.len() {
            3 => None,
            4 => Some(parts[3].to_string()),
            _ => return Err(invalid()),
        };

        Ok(Self {
            group_id: parts[0].to_string(),
            artifact_id: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier,
            extension: extension.to_string(),
        })
    }

    /// `artifactId-version[-classifier].extension`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, c, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension),
        }
    }

    /// Path relative to the libraries directory:
    /// `<group/as/dirs>/<artifact_id>/<version>/<filename>`
    pub fn local_path(&self) -> PathBuf {
        let mut path: PathBuf = self.group_id.split('.').collect();
        path.push(&self.artifact_id);
        path.push(&self.version);
        path.push(self.filename());
        path
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{}", c)?;
        }
        if self.extension != "jar" {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_coordinate() {
        let a = MavenArtifact::parse("net.fabricmc:fabric-loader:0.14.21").unwrap();
        assert_eq!(a.group_id, "net.fabricmc");
        assert_eq!(a.artifact_id, "fabric-loader");
        assert_eq!(a.version, "0.14.21");
        assert_eq!(a.classifier, None);
        assert_eq!(a.extension, "jar");
        assert_eq!(a.to_string(), "net.fabricmc:fabric-loader:0.14.21");
    }

    #[test]
    fn local_path_mirrors_maven_layout() {
        let a = MavenArtifact::parse("org.ow2.asm:asm-tree:9.5").unwrap();
        assert_eq!(
            a.local_path(),
            PathBuf::from("org/ow2/asm/asm-tree/9.5/asm-tree-9.5.jar")
        );
    }

    #[test]
    fn classifier_and_extension() {
        let a = MavenArtifact::parse("org.lwjgl:lwjgl:3.3.1:natives-linux@zip").unwrap();
        assert_eq!(a.filename(), "lwjgl-3.3.1-natives-linux.zip");
        assert_eq!(a.to_string(), "org.lwjgl:lwjgl:3.3.1:natives-linux@zip");
    }

    #[test]
    fn rejects_malformed_coordinates() {
        for coord in ["", "a:b", "a::c", "a:b:c:d:e", "a:b:c@"] {
            assert!(
                MavenArtifact::parse(coord).is_err(),
                "{:?} should be rejected",
                coord
            );
        }
    }
}
