//! Error types
//!
//! Startup and configuration failures are reported through [`Error`].
//! Transient failures inside the running loops (a state poll timing out, a
//! subscriber going away, one bad frame) are handled where they happen and
//! never reach this type at loop level.

use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (socket bind, file read, thread spawn)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Capture region is empty or cannot be derived
    #[error("invalid capture region: {0}")]
    InvalidRegion(String),

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// Frame acquisition failed
    #[error("capture failed: {0}")]
    Capture(String),

    /// Classification failed
    #[error("inference failed: {0}")]
    Inference(String),
}
