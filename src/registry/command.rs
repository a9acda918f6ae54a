//! Registry commands
//!
//! Connection handlers run on their own tasks, but only the broadcaster
//! touches the registry. Handlers queue these commands and the broadcaster
//! applies them.

use std::fmt;

use tokio::sync::mpsc;

use super::sink::{EventSink, SubscriberId};

/// A change to the subscriber set
pub enum RegistryCommand {
    Connect(SubscriberId, Box<dyn EventSink>),
    Disconnect(SubscriberId),
}

impl fmt::Debug for RegistryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryCommand::Connect(id, _) => f.debug_tuple("Connect").field(id).finish(),
            RegistryCommand::Disconnect(id) => f.debug_tuple("Disconnect").field(id).finish(),
        }
    }
}

/// Sending side of the command queue
pub type CommandSender = mpsc::UnboundedSender<RegistryCommand>;

/// Receiving side of the command queue
pub type CommandReceiver = mpsc::UnboundedReceiver<RegistryCommand>;

/// Create a command queue
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::unbounded_channel()
}
