//! WebSocket server
//!
//! Wires the sampler thread, the broadcaster task and the subscriber
//! transport together and runs them until shutdown.

pub mod config;
mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use listener::SentinelServer;
