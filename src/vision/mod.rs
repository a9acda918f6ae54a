//! Minimap sampling and classification
//!
//! Everything that runs on the sampler thread: region derivation, frame
//! capture, classification strategies, zone lookup and the paced loop that
//! feeds the [`Mailbox`](crate::Mailbox).

pub mod classifier;
pub mod config;
pub mod detection;
pub mod frame;
pub mod labels;
pub mod region;
pub mod remote;
pub mod sampler;
pub mod zone;

pub use classifier::{Classifier, ClassifierMode, Model, SubstituteConfig, SubstituteModel};
pub use config::SamplerConfig;
pub use detection::{BoundingBox, Candidate, Detection};
pub use frame::{Frame, FrameSource, SyntheticSource};
pub use labels::LabelTable;
pub use region::CaptureRegion;
pub use remote::{RemoteModel, RemoteModelConfig};
pub use sampler::{select_best, Sampler};
pub use zone::{NormRect, Zone, ZoneTable, UNZONED};
