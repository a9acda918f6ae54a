//! Process-wide stop signal
//!
//! One [`Shutdown`] is created per server run. Every loop holds a
//! [`StopSignal`] and checks it between iterations: the sampler thread polls
//! it synchronously, async tasks await [`StopSignal::stopped`].

use std::sync::Arc;

use tokio::sync::watch;

/// Owner side of the stop signal
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Create a new, untriggered shutdown handle
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Get a signal that observes this handle
    pub fn signal(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Request every observer to stop
    ///
    /// Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Whether [`trigger`](Self::trigger) has been called
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of the stop signal
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Non-blocking check, safe to call from any thread
    ///
    /// True once stop was requested or the owning [`Shutdown`] was dropped.
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolve once stop has been requested
    ///
    /// Also resolves if the owning [`Shutdown`] was dropped.
    pub async fn stopped(&mut self) {
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}
