use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

use crate::task::TaskKey;

/// One cancelable timer per pending join task.
///
/// Each timer is an independent tokio task waiting on its delay. Cancellation
/// goes through a oneshot: a signal delivered strictly before the deadline
/// always wins (the select is biased toward the cancel arm), while a signal
/// sent after firing has begun is dropped on the closed channel and cannot
/// suppress the in-flight callback.
#[derive(Debug, Default)]
pub struct DelayScheduler {
    timers: Mutex<HashMap<TaskKey, oneshot::Sender<()>>>,
}

impl DelayScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a timer that runs `on_fire` after `delay` unless cancelled first.
    ///
    /// A stale timer under the same identity is cancelled before the new one
    /// is installed.
    pub fn schedule<F, Fut>(&self, key: TaskKey, delay: Duration, on_fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let stale = self
            .timers
            .lock()
            .expect("delay scheduler lock poisoned")
            .insert(key, cancel_tx);
        if let Some(stale) = stale {
            debug!(?key, "replacing stale delay timer");
            let _ = stale.send(());
        }

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel_rx => {
                    debug!(?key, "delay timer cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    on_fire().await;
                }
            }
        });
    }

    /// Cancel the timer for `key`. Idempotent: cancelling an unknown,
    /// already-cancelled, or already-fired timer is a no-op.
    ///
    /// Returns whether a still-pending timer was actually stopped.
    pub fn cancel(&self, key: TaskKey) -> bool {
        let handle = self
            .timers
            .lock()
            .expect("delay scheduler lock poisoned")
            .remove(&key);

        match handle {
            Some(cancel_tx) => cancel_tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Drop the handle for a timer whose fire path has claimed the task.
    pub fn forget(&self, key: TaskKey) {
        self.timers
            .lock()
            .expect("delay scheduler lock poisoned")
            .remove(&key);
    }

    /// Cancel every pending timer, for shutdown.
    pub fn cancel_all(&self) {
        let handles: Vec<_> = {
            let mut timers = self.timers.lock().expect("delay scheduler lock poisoned");
            timers.drain().collect()
        };

        for (key, cancel_tx) in handles {
            debug!(?key, "cancelling delay timer at shutdown");
            let _ = cancel_tx.send(());
        }
    }

    pub fn active(&self) -> usize {
        self.timers
            .lock()
            .expect("delay scheduler lock poisoned")
            .len()
    }
}
