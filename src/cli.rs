//! Command line interface
//!
//! Maps flags onto the per-module configuration structs and assembles a
//! ready-to-run [`SentinelServer`].

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::runtime::Handle;

use crate::error::{Error, Result};
use crate::game::{LiveClientPoller, PollerConfig, DEFAULT_GAME_URL};
use crate::mailbox::Mailbox;
use crate::server::{SentinelServer, ServerConfig};
use crate::vision::{
    CaptureRegion, Classifier, ClassifierMode, LabelTable, RemoteModel, RemoteModelConfig,
    SamplerConfig, Sampler, SubstituteConfig, SubstituteModel, SyntheticSource, ZoneTable,
};

/// Display resolution, written `WIDTHxHEIGHT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for DisplaySize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width = w
            .trim()
            .parse()
            .map_err(|_| format!("invalid display width: {w:?}"))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| format!("invalid display height: {h:?}"))?;
        Ok(Self { width, height })
    }
}

impl fmt::Display for DisplaySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Minimap sentinel - watches the minimap and streams detections over WebSocket
///
/// Screen capture is not built in: frames come from a synthetic source that
/// fills the region with a uniform color. With `--classifier model` those
/// are the frames sent to the inference endpoint.
#[derive(Debug, Clone, Parser)]
#[command(name = "minimap-sentinel", version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 8765)]
    pub port: u16,

    /// Primary display resolution, used to locate the minimap
    #[arg(long, default_value = "1920x1080")]
    pub display: DisplaySize,

    /// Frames sampled per second
    #[arg(long, default_value_t = 10)]
    pub fps: u32,

    /// Minimum confidence for a detection to be reported
    #[arg(long, default_value_t = 0.6)]
    pub threshold: f32,

    /// Classification path: substitute or model (model receives synthetic
    /// frames, no screen capture is built in)
    #[arg(long, default_value_t = ClassifierMode::Substitute)]
    pub classifier: ClassifierMode,

    /// Inference endpoint; required with --classifier model. Frames posted
    /// to it come from the synthetic source
    #[arg(long)]
    pub model_url: Option<String>,

    /// Inference request timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub model_timeout_ms: u64,

    /// Seed for the substitute classifier
    #[arg(long)]
    pub seed: Option<u64>,

    /// Per-frame detection probability of the substitute classifier
    #[arg(long, default_value_t = 0.02)]
    pub substitute_probability: f64,

    /// JSON zone table replacing the built-in one
    #[arg(long, value_name = "FILE")]
    pub zones: Option<PathBuf>,

    /// Game client stats endpoint
    #[arg(long, default_value = DEFAULT_GAME_URL)]
    pub game_url: String,

    /// Game client request timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub poll_timeout_ms: u64,

    /// Broadcast tick interval in milliseconds
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,

    /// Per-subscriber send timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub send_timeout_ms: u64,

    /// Maximum concurrent subscribers (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub max_connections: usize,
}

impl Cli {
    /// Reject flag combinations that cannot be run
    pub fn validate(&self) -> Result<()> {
        if self.classifier == ClassifierMode::Model && self.model_url.is_none() {
            return Err(Error::Config(
                "--classifier model requires --model-url".to_string(),
            ));
        }
        for (flag, value) in [
            ("--tick-ms", self.tick_ms),
            ("--send-timeout-ms", self.send_timeout_ms),
            ("--poll-timeout-ms", self.poll_timeout_ms),
            ("--model-timeout-ms", self.model_timeout_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{flag} must be positive")));
            }
        }
        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::with_addr(SocketAddr::new(self.host, self.port))
            .tick_interval(Duration::from_millis(self.tick_ms))
            .send_timeout(Duration::from_millis(self.send_timeout_ms))
            .max_connections(self.max_connections)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig::default()
            .url(self.game_url.clone())
            .timeout(Duration::from_millis(self.poll_timeout_ms))
    }

    pub fn sampler_config(&self) -> Result<SamplerConfig> {
        let region = CaptureRegion::from_display(self.display.width, self.display.height)?;
        let config = SamplerConfig::new(region)
            .fps(self.fps)
            .confidence_threshold(self.threshold)
            .mode(self.classifier);
        config.validate()?;
        Ok(config)
    }

    pub fn substitute_config(&self) -> SubstituteConfig {
        let config = SubstituteConfig::default().probability(self.substitute_probability);
        match self.seed {
            Some(seed) => config.seed(seed),
            None => config,
        }
    }

    pub fn zone_table(&self) -> Result<ZoneTable> {
        match self.zones {
            Some(ref path) => ZoneTable::load(path),
            None => Ok(ZoneTable::default()),
        }
    }

    /// Build the classifier selected by `--classifier`
    ///
    /// `runtime` drives inference requests issued from the sampler thread.
    pub fn classifier(&self, zones: Arc<ZoneTable>, runtime: Handle) -> Result<Classifier> {
        match self.classifier {
            ClassifierMode::Substitute => Ok(Classifier::Substitute(SubstituteModel::new(
                self.substitute_config(),
                LabelTable::default(),
                zones,
            )?)),
            ClassifierMode::Model => {
                let url = self.model_url.as_deref().ok_or_else(|| {
                    Error::Config("--classifier model requires --model-url".to_string())
                })?;
                let config = RemoteModelConfig::new(url)
                    .timeout(Duration::from_millis(self.model_timeout_ms));
                let model = RemoteModel::new(&config, LabelTable::default(), runtime)?;
                Ok(Classifier::Model(Box::new(model)))
            }
        }
    }

    /// Assemble the server
    pub fn build(&self, runtime: Handle) -> Result<SentinelServer<LiveClientPoller>> {
        self.validate()?;

        let sampler_config = self.sampler_config()?;
        tracing::info!(
            display = %self.display,
            region = %sampler_config.region,
            fps = sampler_config.fps,
            classifier = %self.classifier,
            "Sampler configured"
        );

        let zones = Arc::new(self.zone_table()?);
        let classifier = self.classifier(Arc::clone(&zones), runtime)?;
        let mailbox = Arc::new(Mailbox::new());
        let sampler = Sampler::new(
            sampler_config,
            Box::new(SyntheticSource::new()),
            classifier,
            zones,
            Arc::clone(&mailbox),
        )?;
        let poller = LiveClientPoller::new(&self.poller_config())?;

        Ok(SentinelServer::new(
            self.server_config(),
            sampler,
            poller,
            mailbox,
        ))
    }
}
