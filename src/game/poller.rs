//! Live client state poller
//!
//! Queries the game client's local stats endpoint for the in-game clock.
//! The endpoint serves a self-signed certificate on loopback, so
//! certificate validation is disabled for this client only.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Default game stats endpoint
pub const DEFAULT_GAME_URL: &str = "https://127.0.0.1:2999/liveclientdata/gamestats";

/// Source of the current game time
pub trait StatePoller: Send + Sync + 'static {
    /// Game time in seconds, or `None` if unavailable
    ///
    /// Never fails: every error maps to `None`.
    fn poll(&self) -> impl Future<Output = Option<f64>> + Send;
}

/// Poller settings
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Game stats endpoint
    pub url: String,

    /// Per-request timeout; bounds broadcaster tick latency
    pub timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_GAME_URL.to_string(),
            timeout: Duration::from_secs(1),
        }
    }
}

impl PollerConfig {
    /// Set the endpoint
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct GameStats {
    #[serde(rename = "gameTime", default)]
    game_time: f64,
}

/// Poller for the game client's live data API
///
/// Owns one HTTP client so connections are reused across ticks.
#[derive(Debug, Clone)]
pub struct LiveClientPoller {
    client: Client,
    url: Url,
}

impl LiveClientPoller {
    pub fn new(config: &PollerConfig) -> Result<Self> {
        let url = Url::parse(&config.url)
            .map_err(|e| Error::Config(format!("invalid game URL {:?}: {}", config.url, e)))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn fetch(&self) -> Result<f64> {
        let stats: GameStats = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(stats.game_time)
    }
}

impl StatePoller for LiveClientPoller {
    async fn poll(&self) -> Option<f64> {
        match self.fetch().await {
            Ok(game_time) => Some(game_time),
            Err(e) => {
                tracing::trace!(error = %e, "Game state unavailable");
                None
            }
        }
    }
}
