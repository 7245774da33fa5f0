pub mod annotation;
pub mod cache;
pub mod config;
pub mod detection;
pub mod interpolation;
pub mod pipeline;
pub mod possession;
pub mod team;
pub mod tracks;
pub mod video;

// Re-export main types
pub use crate::config::Config;
pub use crate::detection::{Detector, RawDetection, RecordedDetections, TrackedDetection, Tracker};
pub use crate::pipeline::Pipeline;
pub use crate::possession::{Possession, PossessionLog};
pub use crate::team::{JerseyColorAssigner, TeamAssigner};
pub use crate::tracks::{TrackTable, BALL_TRACK_ID};
