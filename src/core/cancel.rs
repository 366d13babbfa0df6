// ─── Cancellation ───

use tokio::sync::watch;

use crate::core::error::{LauncherError, LauncherResult};

/// Owner side. Dropping it without cancelling leaves tokens un-cancelled.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: Some(self.tx.subscribe()),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    pub fn check(&self) -> LauncherResult<()> {
        if self.is_cancelled() {
            Err(LauncherError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves once cancelled; pends forever otherwise.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Source dropped without cancelling.
                return std::future::pending().await;
            }
        }
    }
}
