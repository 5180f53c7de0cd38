//! Markwatch computer vision library
//!
//! Multi-scale template localization and candidate verification for
//! on-screen marker detection.

pub mod bbox;
pub mod detection;
pub mod error;
pub mod template;
pub mod utils;
pub mod verify;

// Re-export commonly used types
pub use bbox::{BBox, MatchCandidate};
pub use detection::{DetectionConfig, FrameReport, MarkerDetector, MarkerReport};
pub use error::MarkerError;
pub use template::{
    Localizer, MatchConfig, Marker, MarkerLoader, MarkerSet, MarkerSource, PreparedFrame,
    ScaleSet,
};
pub use verify::{VerificationResult, Verifier, VerifyConfig};

// Error handling
pub type Result<T> = anyhow::Result<T>;
