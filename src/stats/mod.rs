//! Loop statistics

pub mod metrics;

pub use metrics::{BroadcastStats, SamplerStats};
