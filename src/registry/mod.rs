//! Subscriber registry
//!
//! Tracks connected subscribers and fans each event out to all of them.
//!
//! # Architecture
//!
//! ```text
//!   WebSocket handler ──┐
//!   WebSocket handler ──┼─► RegistryCommand queue ──► Broadcaster
//!   WebSocket handler ──┘                              │ owns
//!                                                      ▼
//!                                          SubscriberRegistry
//!                                   HashMap<SubscriberId, Box<dyn EventSink>>
//!                                                      │ fanout(event)
//!                                        ┌─────────────┼─────────────┐
//!                                        ▼             ▼             ▼
//!                                      sink          sink          sink
//! ```
//!
//! Sends within one fan-out run concurrently. A subscriber whose send fails
//! or times out is removed without affecting the others.

pub mod command;
pub mod error;
pub mod sink;
pub mod store;

pub use command::{command_channel, CommandReceiver, CommandSender, RegistryCommand};
pub use error::RegistryError;
pub use sink::{EventSink, IdAllocator, SubscriberId};
pub use store::{FanoutReport, SubscriberRegistry};
