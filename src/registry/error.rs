//! Registry error types
//!
//! Error types for delivering events to a subscriber.

use std::time::Duration;

/// Error type for a single delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Subscriber connection already closed
    Closed,
    /// Send did not finish within the send timeout
    Timeout(Duration),
    /// Transport-level failure
    Transport(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Closed => write!(f, "Subscriber closed"),
            RegistryError::Timeout(limit) => {
                write!(f, "Send timed out after {}ms", limit.as_millis())
            }
            RegistryError::Transport(reason) => write!(f, "Transport error: {}", reason),
        }
    }
}

impl std::error::Error for RegistryError {}
