//! Cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;

/// Marker error raised when a request observes cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request was canceled")]
pub struct Canceled;

#[derive(Debug, Default)]
struct Inner {
    canceled: AtomicBool,
    notify: Notify,
}

/// Shared cancellation flag; clones observe the same state
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that is already canceled
    pub fn canceled() -> Self {
        let signal = Self::new();
        signal.cancel();
        signal
    }

    pub fn cancel(&self) {
        if !self.inner.canceled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::SeqCst)
    }

    /// Checkpoint: `Err(Canceled)` once the signal fired
    pub fn check(&self) -> Result<(), Canceled> {
        if self.is_canceled() {
            Err(Canceled)
        } else {
            Ok(())
        }
    }

    /// Resolves when the signal fires
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_canceled() {
                return;
            }
            notified.await;
        }
    }

    /// Cancel from a background task after `delay`
    pub fn cancel_after(&self, delay: Duration) {
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            signal.cancel();
        });
    }
}
