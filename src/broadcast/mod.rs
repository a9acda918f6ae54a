//! Event broadcasting
//!
//! The [`Broadcaster`] is the central tick loop: each tick it polls the game
//! state, drains the mailbox, builds one [`Event`] and fans it out to every
//! subscriber.

pub mod broadcaster;
pub mod event;

pub use broadcaster::{Broadcaster, Phase};
pub use event::Event;
