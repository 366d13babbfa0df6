// ─── Progress Events ───
// Fire-and-forget progress broadcast. Emitting never blocks; each registered
// observer is drained by its own forwarding task.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const BUS_CAPACITY: usize = 256;

/// Payload delivered to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    /// 0.0 to 100.0
    pub percentage: f64,
    pub message: String,
}

pub trait ProgressObserver: Send + Sync + 'static {
    fn on_progress(&self, update: &ProgressUpdate);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressUpdate) + Send + Sync + 'static,
{
    fn on_progress(&self, update: &ProgressUpdate) {
        self(update)
    }
}

pub struct ProgressBus {
    tx: broadcast::Sender<ProgressUpdate>,
    last: Mutex<f64>,
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            tx,
            last: Mutex::new(0.0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.tx.subscribe()
    }

    /// Register an observer. A panicking observer is logged and skipped;
    /// it never reaches the emitter. Must be called inside a tokio runtime.
    pub fn register(&self, observer: impl ProgressObserver) -> JoinHandle<()> {
        let mut rx = self.tx.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(update) => {
                        let delivered =
                            catch_unwind(AssertUnwindSafe(|| observer.on_progress(&update)));
                        if delivered.is_err() {
                            warn!("Progress observer panicked on {:?}", update.message);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Progress observer lagged, skipped {} updates", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Start a new operation; the monotonic floor goes back to zero.
    pub fn begin(&self, message: &str) {
        if let Ok(mut last) = self.last.lock() {
            *last = 0.0;
        }
        self.send(0.0, message);
    }

    /// Emit an update. Percentages are clamped to `[previous, 100]` so
    /// observers only ever see progress move forward.
    pub fn emit(&self, percentage: f64, message: impl Into<String>) {
        let value = match self.last.lock() {
            Ok(mut last) => {
                let clamped = percentage.clamp(0.0, 100.0).max(*last);
                *last = clamped;
                clamped
            }
            Err(_) => percentage.clamp(0.0, 100.0),
        };
        self.send(value, message);
    }

    fn send(&self, percentage: f64, message: impl Into<String>) {
        let update = ProgressUpdate {
            percentage,
            message: message.into(),
        };
        debug!("[{:>5.1}%] {}", update.percentage, update.message);
        // No receivers is fine.
        let _ = self.tx.send(update);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn percentages_never_move_backwards() {
        let bus = ProgressBus::new();
        let mut rx = bus.subscribe();

        bus.emit(10.0, "a");
        bus.emit(5.0, "b");
        bus.emit(150.0, "c");

        let seen: Vec<f64> = vec![
            rx.recv().await.unwrap().percentage,
            rx.recv().await.unwrap().percentage,
            rx.recv().await.unwrap().percentage,
        ];
        assert_eq!(seen, vec![10.0, 10.0, 100.0]);
    }

    #[tokio::test]
    async fn begin_resets_floor() {
        let bus = ProgressBus::new();
        bus.emit(80.0, "old");
        let mut rx = bus.subscribe();
        bus.begin("new");
        bus.emit(1.0, "step");

        assert_eq!(rx.recv().await.unwrap().percentage, 0.0);
        assert_eq!(rx.recv().await.unwrap().percentage, 1.0);
    }

    #[tokio::test]
    async fn panicking_observer_does_not_affect_others() {
        let bus = ProgressBus::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        bus.register(|_: &ProgressUpdate| panic!("observer bug"));
        let sink = Arc::clone(&received);
        bus.register(move |u: &ProgressUpdate| sink.lock().unwrap().push(u.message.clone()));

        bus.emit(1.0, "one");
        bus.emit(2.0, "two");

        for _ in 0..50 {
            if received.lock().unwrap().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(*received.lock().unwrap(), vec!["one", "two"]);
    }
}
