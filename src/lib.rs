//! # minimap-sentinel
//!
//! Watches a fixed region of the screen (a game minimap), classifies what it
//! sees and streams the result to WebSocket subscribers.
//!
//! # Architecture
//!
//! ```text
//!   sampler thread                       tokio runtime
//!  ┌──────────────────┐              ┌──────────────────────────┐
//!  │ FrameSource      │              │ Broadcaster (tick loop)  │
//!  │   └► Classifier  │   publish    │   ├─ StatePoller::poll() │
//!  │       └► zone    │ ──────────►  │   ├─ Mailbox::take()     │
//!  │          lookup  │   Mailbox    │   └─ registry.fanout()   │──► subscribers
//!  └──────────────────┘  (1 slot)    └──────────────────────────┘
//!                                         ▲
//!                    WebSocket handlers ──┘ RegistryCommand queue
//! ```
//!
//! The sampler and the broadcaster are paced independently. The only state
//! they share is the single-slot [`Mailbox`], where the newest detection
//! always replaces an unconsumed older one.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use minimap_sentinel::game::{LiveClientPoller, PollerConfig};
//! use minimap_sentinel::vision::{
//!     CaptureRegion, Classifier, LabelTable, SamplerConfig, Sampler, SubstituteConfig,
//!     SubstituteModel, SyntheticSource, ZoneTable,
//! };
//! use minimap_sentinel::{Mailbox, SentinelServer, ServerConfig};
//!
//! # async fn example() -> minimap_sentinel::Result<()> {
//! let region = CaptureRegion::from_display(1920, 1080)?;
//! let zones = Arc::new(ZoneTable::default());
//! let mailbox = Arc::new(Mailbox::new());
//!
//! let classifier = Classifier::Substitute(SubstituteModel::new(
//!     SubstituteConfig::default(),
//!     LabelTable::default(),
//!     Arc::clone(&zones),
//! )?);
//! let sampler = Sampler::new(
//!     SamplerConfig::new(region),
//!     Box::new(SyntheticSource::new()),
//!     classifier,
//!     zones,
//!     Arc::clone(&mailbox),
//! )?;
//! let poller = LiveClientPoller::new(&PollerConfig::default())?;
//!
//! let server = SentinelServer::new(ServerConfig::default(), sampler, poller, mailbox);
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
pub mod cli;
pub mod error;
pub mod game;
pub mod mailbox;
pub mod registry;
pub mod server;
pub mod shutdown;
pub mod stats;
pub mod vision;

pub use error::{Error, Result};
pub use mailbox::Mailbox;
pub use server::{SentinelServer, ServerConfig};
pub use shutdown::{Shutdown, StopSignal};
