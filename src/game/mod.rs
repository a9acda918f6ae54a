//! Game state polling
//!
//! The broadcaster asks a [`StatePoller`] for the current game time once per
//! tick. `None` means the game is not running or not reachable.

pub mod poller;

pub use poller::{LiveClientPoller, PollerConfig, StatePoller, DEFAULT_GAME_URL};
