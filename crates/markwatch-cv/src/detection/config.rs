//! Detection configuration

use crate::template::{MatchConfig, ScaleSet};
use crate::verify::VerifyConfig;
use serde::{Deserialize, Serialize};

/// Main detection configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub matching: MatchConfig,
    pub verification: VerifyConfig,
    /// Marker whose disappearance after an appearance raises an adverse event
    pub hold_marker: Option<String>,
}

impl DetectionConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.matching.threshold = threshold;
        self
    }

    pub fn with_scales(mut self, scales: ScaleSet) -> Self {
        self.matching.scales = scales;
        self
    }

    pub fn with_hold_marker(mut self, hold_marker: Option<String>) -> Self {
        self.hold_marker = hold_marker;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DetectionConfig::default();
        assert_eq!(config.matching.threshold, 0.90);
        assert_eq!(config.matching.scales.as_slice(), &[1.0]);
        assert_eq!(config.verification.min_structural_similarity, 0.85);
        assert_eq!(config.verification.min_histogram_correlation, 0.5);
        assert!(config.hold_marker.is_none());
    }

    #[test]
    fn test_builder() {
        let config = DetectionConfig::default()
            .with_threshold(0.8)
            .with_scales(ScaleSet::parse("0.9,1.1"))
            .with_hold_marker(Some("shield".into()));
        assert_eq!(config.matching.threshold, 0.8);
        assert_eq!(config.matching.scales.len(), 2);
        assert_eq!(config.hold_marker.as_deref(), Some("shield"));
    }
}
