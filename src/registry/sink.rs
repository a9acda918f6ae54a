//! Subscriber handles
//!
//! The registry does not know what transport a subscriber uses. Each
//! connection is represented by an [`EventSink`] that can send one text
//! payload at a time and be closed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::BoxFuture;

use super::error::RegistryError;

/// Identity of a connected subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out unique subscriber ids
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> SubscriberId {
        SubscriberId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Write half of a subscriber connection
pub trait EventSink: Send {
    /// Deliver one serialized event
    fn send<'a>(&'a mut self, payload: &'a str) -> BoxFuture<'a, Result<(), RegistryError>>;

    /// Close the connection; errors are ignored
    fn close(&mut self) -> BoxFuture<'_, ()>;
}
