//! Subscriber registry implementation
//!
//! Owned by the broadcaster and mutated only from its task, so no lock is
//! needed. A failed delivery removes that subscriber and nobody else.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

use futures::future::join_all;

use super::command::RegistryCommand;
use super::error::RegistryError;
use super::sink::{EventSink, SubscriberId};
use crate::broadcast::Event;

/// Outcome of one fan-out
#[derive(Debug, Default)]
pub struct FanoutReport {
    /// Subscribers that received the event
    pub delivered: usize,
    /// Subscribers removed, with the reason
    pub dropped: Vec<(SubscriberId, RegistryError)>,
}

/// Set of connected subscribers
pub struct SubscriberRegistry {
    subscribers: HashMap<SubscriberId, Box<dyn EventSink>>,
    send_timeout: Duration,
}

impl SubscriberRegistry {
    /// Create an empty registry
    ///
    /// `send_timeout` bounds how long one subscriber may hold up a fan-out.
    pub fn new(send_timeout: Duration) -> Self {
        Self {
            subscribers: HashMap::new(),
            send_timeout,
        }
    }

    /// Add a subscriber
    ///
    /// Returns false (and drops `sink`) if the id is already registered.
    pub fn add(&mut self, id: SubscriberId, sink: Box<dyn EventSink>) -> bool {
        match self.subscribers.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(sink);
                true
            }
        }
    }

    /// Remove a subscriber
    ///
    /// Returns false if the id was not registered.
    pub fn remove(&mut self, id: SubscriberId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Apply a queued connect or disconnect
    ///
    /// Returns true if membership changed.
    pub fn apply(&mut self, command: RegistryCommand) -> bool {
        match command {
            RegistryCommand::Connect(id, sink) => {
                let added = self.add(id, sink);
                if added {
                    tracing::info!(subscriber = %id, total = self.len(), "Subscriber connected");
                }
                added
            }
            RegistryCommand::Disconnect(id) => {
                let removed = self.remove(id);
                if removed {
                    tracing::info!(subscriber = %id, total = self.len(), "Subscriber disconnected");
                }
                removed
            }
        }
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Serialize `event` once and deliver it to every subscriber
    pub async fn fanout(&mut self, event: &Event) -> FanoutReport {
        if self.subscribers.is_empty() {
            return FanoutReport::default();
        }

        match event.to_json() {
            Ok(payload) => self.fanout_payload(&payload).await,
            Err(e) => {
                tracing::error!(error = %e, kind = event.kind(), "Failed to serialize event");
                FanoutReport::default()
            }
        }
    }

    /// Deliver a pre-serialized payload to every subscriber
    ///
    /// Sends run concurrently and this returns once each has finished,
    /// failed or timed out. Failed subscribers are removed.
    pub async fn fanout_payload(&mut self, payload: &str) -> FanoutReport {
        let timeout = self.send_timeout;

        let sends = self.subscribers.iter_mut().map(|(id, sink)| async move {
            let result = match tokio::time::timeout(timeout, sink.send(payload)).await {
                Ok(result) => result,
                Err(_) => Err(RegistryError::Timeout(timeout)),
            };
            (*id, result)
        });
        let results = join_all(sends).await;

        let mut report = FanoutReport::default();
        for (id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => report.dropped.push((id, e)),
            }
        }

        for (id, error) in &report.dropped {
            self.subscribers.remove(id);
            tracing::debug!(subscriber = %id, error = %error, "Subscriber dropped after failed send");
        }

        report
    }

    /// Close and remove every subscriber
    pub async fn close_all(&mut self) {
        let timeout = self.send_timeout;
        let closes = self.subscribers.drain().map(|(_, mut sink)| async move {
            let _ = tokio::time::timeout(timeout, sink.close()).await;
        });
        join_all(closes).await;
    }
}
