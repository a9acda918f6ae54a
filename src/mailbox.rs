//! Single-slot detection handoff
//!
//! The sampler thread publishes into the slot, the broadcaster takes from
//! it. The slot holds at most one detection: publishing replaces whatever
//! is there, taking empties it. Neither side ever waits for the other.
//!
//! This is deliberately lossy. If several detections land between two
//! broadcaster ticks, only the newest one is delivered.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::vision::Detection;

/// Most-recent-wins detection slot
#[derive(Debug, Default)]
pub struct Mailbox {
    slot: Mutex<Option<Detection>>,
}

impl Mailbox {
    /// Create an empty mailbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a detection, replacing any unconsumed one
    ///
    /// Returns true if an unconsumed detection was overwritten.
    pub fn publish(&self, detection: Detection) -> bool {
        self.lock().replace(detection).is_some()
    }

    /// Take the pending detection, leaving the slot empty
    pub fn take(&self) -> Option<Detection> {
        self.lock().take()
    }

    /// Whether a detection is waiting
    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Detection>> {
        // The guarded value is a plain Option, valid even if a holder panicked
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
