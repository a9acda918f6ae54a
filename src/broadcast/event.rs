//! Wire events
//!
//! One JSON object per message, tagged by `type`:
//!
//! ```json
//! {"type":"alert","label":"Vi","zone":"TOP RIVER","confidence":0.91,"game_time":312.5,"timestamp":"2026-01-01T12:00:00.000+00:00"}
//! {"type":"heartbeat","game_time":null,"in_game":false}
//! ```

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::vision::Detection;

/// Event sent to subscribers, one per tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// A detection was pending
    Alert {
        label: String,
        zone: String,
        confidence: f32,
        game_time: Option<f64>,
        /// Frame capture time, RFC 3339
        timestamp: String,
    },
    /// Nothing pending; liveness signal
    Heartbeat {
        game_time: Option<f64>,
        in_game: bool,
    },
}

impl Event {
    pub fn alert(detection: Detection, game_time: Option<f64>) -> Self {
        Event::Alert {
            timestamp: detection
                .captured_at
                .to_rfc3339_opts(SecondsFormat::Millis, false),
            label: detection.label,
            zone: detection.zone,
            confidence: detection.confidence,
            game_time,
        }
    }

    pub fn heartbeat(game_time: Option<f64>) -> Self {
        Event::Heartbeat {
            game_time,
            in_game: game_time.is_some(),
        }
    }

    /// The event for one tick: an alert if a detection was taken, else a
    /// heartbeat
    pub fn for_tick(detection: Option<Detection>, game_time: Option<f64>) -> Self {
        match detection {
            Some(detection) => Self::alert(detection, game_time),
            None => Self::heartbeat(game_time),
        }
    }

    /// Value of the `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Alert { .. } => "alert",
            Event::Heartbeat { .. } => "heartbeat",
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Event::Alert { .. })
    }

    pub fn game_time(&self) -> Option<f64> {
        match self {
            Event::Alert { game_time, .. } | Event::Heartbeat { game_time, .. } => *game_time,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
