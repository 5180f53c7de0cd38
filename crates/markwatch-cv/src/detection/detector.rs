//! Runs localization and verification for every marker of a frame

use super::config::DetectionConfig;
use crate::bbox::MatchCandidate;
use crate::error::MarkerError;
use crate::template::loader::normalize_marker_name;
use crate::template::{Localizer, Marker, MarkerSet, PreparedFrame};
use crate::verify::{VerificationResult, Verifier};
use crate::Result;
use image::RgbImage;
use markwatch_core::{MarkerTracker, Observation};
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

/// Outcome for one marker in one frame
#[derive(Debug, Clone, Serialize)]
pub struct MarkerReport {
    pub marker: String,
    /// Best placement across scales, if any scale fit the frame
    pub candidate: Option<MatchCandidate>,
    /// Present only when the candidate passed the score gate
    pub verification: Option<VerificationResult>,
    pub accepted: bool,
}

impl MarkerReport {
    pub fn observation(&self) -> Observation<'_> {
        Observation {
            marker: &self.marker,
            accepted: self.accepted,
        }
    }

    pub fn score(&self) -> Option<f64> {
        self.candidate.as_ref().map(|c| c.score)
    }
}

/// Detection statistics
#[derive(Debug, Clone, Serialize)]
pub struct DetectionStats {
    pub markers: usize,
    pub accepted: usize,
    pub processing_time_ms: u64,
}

/// All marker reports for one frame, in marker-set order
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub markers: Vec<MarkerReport>,
    pub stats: DetectionStats,
}

impl FrameReport {
    pub fn observations(&self) -> Vec<Observation<'_>> {
        self.markers.iter().map(MarkerReport::observation).collect()
    }

    pub fn get(&self, marker: &str) -> Option<&MarkerReport> {
        self.markers.iter().find(|r| r.marker == marker)
    }
}

/// Localizer + verifier over a fixed marker set
pub struct MarkerDetector {
    markers: MarkerSet,
    config: DetectionConfig,
    verifier: Verifier,
}

impl MarkerDetector {
    /// Create new detector. A configured hold marker must name a loaded marker.
    pub fn new(markers: MarkerSet, mut config: DetectionConfig) -> Result<Self> {
        if let Some(hold) = config.hold_marker.take() {
            let hold = normalize_marker_name(&hold);
            if !markers.contains(&hold) {
                return Err(MarkerError::UnknownHoldMarker(hold).into());
            }
            config.hold_marker = Some(hold);
        }

        let verifier = Verifier::new(config.matching.threshold, config.verification.clone());

        Ok(Self {
            markers,
            config,
            verifier,
        })
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Fresh per-pipeline state for this detector's markers
    pub fn tracker(&self) -> MarkerTracker {
        MarkerTracker::new(self.markers.names(), self.config.hold_marker.clone())
    }

    /// Detect every marker in `frame`
    pub fn detect(&self, frame: &RgbImage) -> FrameReport {
        let start_time = Instant::now();
        let prepared = PreparedFrame::new(frame);

        #[cfg(feature = "parallel")]
        let markers: Vec<MarkerReport> = {
            use rayon::prelude::*;
            self.markers
                .as_slice()
                .par_iter()
                .map(|marker| self.detect_marker(&prepared, marker))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let markers: Vec<MarkerReport> = self
            .markers
            .iter()
            .map(|marker| self.detect_marker(&prepared, marker))
            .collect();

        let stats = DetectionStats {
            markers: markers.len(),
            accepted: markers.iter().filter(|r| r.accepted).count(),
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        };

        FrameReport { markers, stats }
    }

    /// Localize, gate on score, then verify a single marker
    pub fn detect_marker(&self, prepared: &PreparedFrame<'_>, marker: &Marker) -> MarkerReport {
        let candidate = Localizer::locate(prepared, marker, &self.config.matching.scales);

        let verification = candidate
            .as_ref()
            .filter(|c| c.passes(self.config.matching.threshold))
            .map(|c| self.verifier.verify(marker, prepared.frame(), c));

        let accepted = verification.is_some_and(|v| v.accepted);

        match (&candidate, &verification) {
            (Some(c), Some(v)) if !accepted => debug!(
                marker = %marker.name,
                score = format_args!("{:.3}", c.score),
                ssim = format_args!("{:.3}", v.structural_similarity),
                hist = format_args!("{:.3}", v.histogram_correlation),
                "miss"
            ),
            (Some(c), None) => debug!(
                marker = %marker.name,
                best_score = format_args!("{:.3}", c.score),
                "miss"
            ),
            (None, _) => debug!(marker = %marker.name, "miss, marker larger than frame"),
            _ => {}
        }

        MarkerReport {
            marker: marker.name.clone(),
            candidate,
            verification,
            accepted,
        }
    }
}
