use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::core::cancel::CancelToken;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{HttpRequest, HttpTransport};

/// Digest used to address and verify content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    pub fn digest_hex(self, bytes: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha1 => hex::encode(Sha1::digest(bytes)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha1 => f.write_str("SHA-1"),
            HashAlgorithm::Sha256 => f.write_str("SHA-256"),
        }
    }
}

/// Result of a single fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Already on disk with the expected hash; no network access happened.
    Skipped,
    Downloaded,
    Failed(LauncherError),
}

impl FetchOutcome {
    pub fn into_result(self) -> LauncherResult<()> {
        match self {
            FetchOutcome::Failed(e) => Err(e),
            _ => Ok(()),
        }
    }
}

/// A single file to fetch, named for reporting.
#[derive(Debug, Clone)]
pub struct FetchItem {
    pub name: String,
    pub url: String,
    pub dest: PathBuf,
    pub hash: String,
}

/// Tally of a batch. Per-item failures are collected, never fatal.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub skipped: usize,
    pub downloaded: usize,
    pub failures: Vec<(String, LauncherError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.skipped + self.downloaded + self.failures.len()
    }

    pub fn failed_names(&self) -> Vec<String> {
        self.failures.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Content-addressed, hash-verified fetcher.
pub struct ContentFetcher {
    transport: Arc<dyn HttpTransport>,
    algorithm: HashAlgorithm,
    /// Maximum number of parallel downloads in a batch.
    concurrency: usize,
    /// Extra attempts after a transient failure.
    retries: u32,
    retry_delay: Duration,
}

impl ContentFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, algorithm: HashAlgorithm) -> Self {
        Self {
            transport,
            algorithm,
            concurrency: 8,
            retries: 2,
            retry_delay: Duration::from_millis(250),
        }
    }

    /// Retry transient failures up to `retries` times, waiting
    /// `delay * attempt` between tries.
    pub fn with_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    // ── Single file ─────────────────────────────────────

    /// Make `dest` hold the content hashing to `expected`.
    pub async fn fetch(&self, url: &str, dest: &Path, expected: &str) -> FetchOutcome {
        if self.matches(dest, expected).await {
            debug!("Up to date: {:?}", dest);
            return FetchOutcome::Skipped;
        }
        let mut attempt = 0;
        loop {
            match self.download(url, dest, expected).await {
                Ok(()) => return FetchOutcome::Downloaded,
                Err(e) if attempt < self.retries && is_transient(&e) => {
                    attempt += 1;
                    warn!("Retrying {} ({}/{}): {}", url, attempt, self.retries, e);
                    tokio::time::sleep(self.retry_delay * attempt).await;
                }
                Err(e) => return FetchOutcome::Failed(e),
            }
        }
    }

    /// True when `path` exists and its digest equals `expected`.
    /// An unreadable file counts as absent.
    pub async fn matches(&self, path: &Path, expected: &str) -> bool {
        match tokio::fs::read(path).await {
            Ok(bytes) => self.algorithm.digest_hex(&bytes).eq_ignore_ascii_case(expected),
            Err(_) => false,
        }
    }

    async fn download(&self, url: &str, dest: &Path, expected: &str) -> LauncherResult<()> {
        let response = self.transport.execute(HttpRequest::get(url)).await?;
        if !response.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: response.status,
            });
        }

        // Validate before touching the destination.
        let actual = self.algorithm.digest_hex(&response.body);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(LauncherError::HashMismatch {
                artifact: dest.display().to_string(),
                algorithm: self.algorithm,
                expected: expected.to_string(),
                actual,
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        // Only a complete file ever appears at `dest`.
        let partial = partial_path(dest);
        {
            let mut file = tokio::fs::File::create(&partial)
                .await
                .map_err(|e| LauncherError::io(&partial, e))?;
            file.write_all(&response.body)
                .await
                .map_err(|e| LauncherError::io(&partial, e))?;
            file.flush()
                .await
                .map_err(|e| LauncherError::io(&partial, e))?;
        }
        tokio::fs::rename(&partial, dest)
            .await
            .map_err(|e| LauncherError::io(dest, e))?;

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }

    // ── Batch ───────────────────────────────────────────

    /// Fetch every item with bounded fan-out. `on_item` runs on the calling
    /// task after each completion, so a plain counter is enough for progress.
    /// Only cancellation aborts the batch.
    pub async fn fetch_all<F>(
        &self,
        items: Vec<FetchItem>,
        cancel: &CancelToken,
        mut on_item: F,
    ) -> LauncherResult<BatchReport>
    where
        F: FnMut(&FetchItem, &FetchOutcome),
    {
        info!(
            "Starting batch fetch: {} files, concurrency={}",
            items.len(),
            self.concurrency
        );

        let mut pending = stream::iter(items)
            .map(|item| async move {
                let outcome = self.fetch(&item.url, &item.dest, &item.hash).await;
                (item, outcome)
            })
            .buffer_unordered(self.concurrency);

        let mut report = BatchReport::default();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LauncherError::Cancelled),
                next = pending.next() => next,
            };
            let Some((item, outcome)) = next else {
                break;
            };

            on_item(&item, &outcome);
            match outcome {
                FetchOutcome::Skipped => report.skipped += 1,
                FetchOutcome::Downloaded => report.downloaded += 1,
                FetchOutcome::Failed(e) => {
                    warn!("Failed to fetch {}: {}", item.name, e);
                    report.failures.push((item.name, e));
                }
            }
        }

        info!(
            "Batch done: {} downloaded, {} up to date, {} failed",
            report.downloaded,
            report.skipped,
            report.failures.len()
        );
        Ok(report)
    }
}

/// `<dest>.part`, next to the final file so the rename stays on one filesystem.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Connection errors, 5xx and 429 may succeed on a later attempt.
fn is_transient(err: &LauncherError) -> bool {
    match err {
        LauncherError::Transport { .. } | LauncherError::Http(_) => true,
        LauncherError::DownloadFailed { status, .. } => *status >= 500 || *status == 429,
        _ => false,
    }
}
