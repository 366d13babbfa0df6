use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::auth::AuthError;
use crate::core::downloader::HashAlgorithm;

/// Broad failure classes callers use to decide whether a retry makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection, timeout or non-2xx status.
    Network,
    /// Malformed JSON or a missing expected field.
    Decode,
    /// Content hash mismatch.
    Integrity,
    /// Missing or insufficient local runtime, filesystem trouble.
    Environment,
    /// Local, non-network conditions such as an unknown version.
    State,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Decode => "decode",
            ErrorKind::Integrity => "integrity",
            ErrorKind::Environment => "environment",
            ErrorKind::State => "state",
        };
        f.write_str(name)
    }
}

/// Central error type for the entire launcher backend.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Decode ──────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed response from {context}: missing `{field}`")]
    MissingField { context: String, field: String },

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── Integrity ───────────────────────────────────────
    #[error("{algorithm} mismatch for {artifact}: expected {expected}, got {actual}")]
    HashMismatch {
        artifact: String,
        algorithm: HashAlgorithm,
        expected: String,
        actual: String,
    },

    #[error("invalid content hash `{0}`")]
    InvalidHash(String),

    // ── Java ────────────────────────────────────────────
    #[error("Java not found: {0}")]
    JavaNotFound(String),

    #[error("environment unsupported: Java {required} or newer is required, found {found}")]
    UnsupportedRuntime { required: String, found: String },

    #[error("Java execution failed: {0}")]
    JavaExecution(String),

    // ── Loader ──────────────────────────────────────────
    #[error("Loader error: {0}")]
    Loader(String),

    // ── Profile ─────────────────────────────────────────
    #[error("version {0} not found in manifest")]
    VersionNotFound(String),

    #[error("no installed profile found under {0:?}")]
    ProfileNotFound(PathBuf),

    #[error("failed to verify game files, please reinstall ({} missing or corrupt)", .0.len())]
    FilesNeedReinstall(Vec<String>),

    #[error("installation incomplete: {} of {total} items failed", .failed.len())]
    InstallIncomplete { failed: Vec<String>, total: usize },

    #[error("operation cancelled")]
    Cancelled,

    // ── Auth ────────────────────────────────────────────
    #[error("failed to authenticate")]
    Authentication(#[source] AuthError),

    // ── Stage context ───────────────────────────────────
    #[error("{stage}: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<LauncherError>,
    },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl From<AuthError> for LauncherError {
    fn from(source: AuthError) -> Self {
        LauncherError::Authentication(source)
    }
}

impl LauncherError {
    /// Attach a path to an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LauncherError::Http(_)
            | LauncherError::Transport { .. }
            | LauncherError::DownloadFailed { .. } => ErrorKind::Network,

            LauncherError::Json(_)
            | LauncherError::MissingField { .. }
            | LauncherError::InvalidMavenCoordinate(_) => ErrorKind::Decode,

            LauncherError::HashMismatch { .. } | LauncherError::InvalidHash(_) => {
                ErrorKind::Integrity
            }

            LauncherError::Io { .. }
            | LauncherError::JavaNotFound(_)
            | LauncherError::UnsupportedRuntime { .. }
            | LauncherError::JavaExecution(_)
            | LauncherError::Loader(_) => ErrorKind::Environment,

            LauncherError::VersionNotFound(_)
            | LauncherError::ProfileNotFound(_)
            | LauncherError::FilesNeedReinstall(_)
            | LauncherError::InstallIncomplete { .. }
            | LauncherError::Cancelled
            | LauncherError::Other(_) => ErrorKind::State,

            LauncherError::Authentication(inner) => inner.kind(),
            LauncherError::Stage { source, .. } => source.kind(),
        }
    }

    /// Only network failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Network
    }

    pub fn is_quick_auth_unavailable(&self) -> bool {
        match self {
            LauncherError::Authentication(AuthError::QuickAuthUnavailable) => true,
            LauncherError::Stage { source, .. } => source.is_quick_auth_unavailable(),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            LauncherError::Cancelled => true,
            LauncherError::Stage { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Wraps an error with the name of the pipeline stage that produced it.
pub trait ResultExt<T> {
    fn stage(self, stage: &str) -> LauncherResult<T>;
}

impl<T> ResultExt<T> for LauncherResult<T> {
    /// Cancellation passes through unwrapped; it is not a stage failure.
    fn stage(self, stage: &str) -> LauncherResult<T> {
        self.map_err(|source| match source {
            LauncherError::Cancelled => LauncherError::Cancelled,
            source => LauncherError::Stage {
                stage: stage.to_string(),
                source: Box::new(source),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_leaves_cancellation_unwrapped() {
        let result: LauncherResult<()> = Err(LauncherError::Cancelled);
        assert!(matches!(
            result.stage("failed to download assets"),
            Err(LauncherError::Cancelled)
        ));
    }

    #[test]
    fn stage_wrapper_preserves_kind_and_source() {
        let result: LauncherResult<()> = Err(LauncherError::DownloadFailed {
            url: "https://example.com/a".into(),
            status: 503,
        });
        let err = result.stage("failed to download assets").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.is_retryable());
        assert!(err.to_string().starts_with("failed to download assets: "));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn state_errors_are_not_retryable() {
        let err = LauncherError::VersionNotFound("9.9".into());
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(!err.is_retryable());

        let err = LauncherError::FilesNeedReinstall(vec!["a".into(), "b".into()]);
        assert!(err.to_string().contains("2 missing or corrupt"));
    }

    #[test]
    fn authentication_error_hides_hop_in_display_but_keeps_it_as_source() {
        let err = LauncherError::from(AuthError::QuickAuthUnavailable);
        assert_eq!(err.to_string(), "failed to authenticate");
        assert!(err.is_quick_auth_unavailable());
        assert_eq!(err.kind(), ErrorKind::State);

        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert!(source.is_some_and(|s| s.contains("quick")));
    }
}
