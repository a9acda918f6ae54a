//! Broadcast tick loop
//!
//! Runs on the async runtime and owns the subscriber registry. Each tick:
//!
//! 1. apply queued connects/disconnects
//! 2. poll the game state
//! 3. take the pending detection, if any
//! 4. build an alert or a heartbeat
//! 5. fan it out and wait for every send to finish
//!
//! Ticks are fixed-rate. A tick that overruns its interval is followed by
//! the next one immediately, and missed ticks are not replayed.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::event::Event;
use crate::game::StatePoller;
use crate::mailbox::Mailbox;
use crate::registry::{CommandReceiver, RegistryCommand, SubscriberRegistry};
use crate::shutdown::StopSignal;
use crate::stats::BroadcastStats;

/// Whether anyone is listening
///
/// Only affects whether fan-out does any work; ticks continue either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No subscribers
    Idle,
    /// At least one subscriber
    Active,
}

/// Central broadcast loop
pub struct Broadcaster<P: StatePoller> {
    poller: P,
    mailbox: Arc<Mailbox>,
    registry: SubscriberRegistry,
    commands: CommandReceiver,
    tick_interval: Duration,
    phase: Phase,
    stats: BroadcastStats,
}

impl<P: StatePoller> Broadcaster<P> {
    pub fn new(
        poller: P,
        mailbox: Arc<Mailbox>,
        registry: SubscriberRegistry,
        commands: CommandReceiver,
        tick_interval: Duration,
    ) -> Self {
        let mut broadcaster = Self {
            poller,
            mailbox,
            registry,
            commands,
            tick_interval,
            phase: Phase::Idle,
            stats: BroadcastStats::new(),
        };
        broadcaster.update_phase();
        broadcaster
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &BroadcastStats {
        &self.stats
    }

    /// Run one tick and return the event that was sent
    pub async fn tick(&mut self) -> Event {
        self.drain_commands();

        let game_time = self.poller.poll().await;
        let detection = self.mailbox.take();
        let event = Event::for_tick(detection, game_time);

        self.stats.ticks += 1;
        if game_time.is_none() {
            self.stats.poll_unavailable += 1;
        }
        match &event {
            Event::Alert {
                label,
                zone,
                confidence,
                ..
            } => {
                self.stats.alerts += 1;
                tracing::info!(
                    label = %label,
                    zone = %zone,
                    confidence = *confidence,
                    game_time = ?game_time,
                    subscribers = self.registry.len(),
                    "Alert"
                );
            }
            Event::Heartbeat { in_game, .. } => {
                self.stats.heartbeats += 1;
                tracing::trace!(in_game = *in_game, game_time = ?game_time, "Heartbeat");
            }
        }

        let report = self.registry.fanout(&event).await;
        self.stats.delivered += report.delivered as u64;
        if !report.dropped.is_empty() {
            self.stats.dropped_subscribers += report.dropped.len() as u64;
            self.update_phase();
        }

        event
    }

    /// Tick until `stop` is observed, then close every subscriber
    pub async fn run(mut self, mut stop: StopSignal) -> BroadcastStats {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_ms = self.tick_interval.as_millis() as u64,
            "Broadcaster started"
        );

        loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => break,
                Some(command) = self.commands.recv() => self.apply(command),
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        let open = self.registry.len();
        self.registry.close_all().await;
        self.update_phase();

        tracing::info!(
            ticks = self.stats.ticks,
            alerts = self.stats.alerts,
            heartbeats = self.stats.heartbeats,
            dropped = self.stats.dropped_subscribers,
            closed = open,
            "Broadcaster stopped"
        );

        self.stats
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: RegistryCommand) {
        if self.registry.apply(command) {
            self.update_phase();
        }
    }

    fn update_phase(&mut self) {
        let phase = if self.registry.is_empty() {
            Phase::Idle
        } else {
            Phase::Active
        };

        if phase != self.phase {
            tracing::info!(from = ?self.phase, to = ?phase, "Broadcaster phase changed");
            self.phase = phase;
        }
    }
}
