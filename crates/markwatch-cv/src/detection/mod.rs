//! Per-frame detection over a whole marker set

pub mod config;
pub mod detector;

pub use config::DetectionConfig;
pub use detector::{DetectionStats, FrameReport, MarkerDetector, MarkerReport};
