//! Secondary verification of localized candidates
//!
//! Raw correlation over-fires on repeated UI chrome. A candidate is only
//! accepted when the region also agrees with the marker structurally and
//! in its luminance distribution.

pub mod histogram;
pub mod ssim;

pub use histogram::{histogram_correlation, luminance_histogram};
pub use ssim::structural_similarity;

use crate::bbox::MatchCandidate;
use crate::template::Marker;
use crate::utils::ImageUtils;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Verification thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    pub min_structural_similarity: f64,
    pub min_histogram_correlation: f64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            min_structural_similarity: 0.85,
            min_histogram_correlation: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub structural_similarity: f64,
    pub histogram_correlation: f64,
    pub accepted: bool,
}

impl VerificationResult {
    fn rejected() -> Self {
        Self {
            structural_similarity: 0.0,
            histogram_correlation: 0.0,
            accepted: false,
        }
    }
}

/// Confirms or rejects candidates against the unscaled marker
#[derive(Debug, Clone)]
pub struct Verifier {
    threshold: f64,
    config: VerifyConfig,
}

impl Verifier {
    /// `threshold` is the same correlation gate used when selecting candidates
    pub fn new(threshold: f64, config: VerifyConfig) -> Self {
        Self { threshold, config }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    pub fn verify(
        &self,
        marker: &Marker,
        frame: &RgbImage,
        candidate: &MatchCandidate,
    ) -> VerificationResult {
        if !candidate.bbox.fits_within(frame.width(), frame.height())
            || marker.width() == 0
            || marker.height() == 0
        {
            return VerificationResult::rejected();
        }

        // Bring the region back to the marker's native size before comparing
        let region = ImageUtils::crop(frame, &candidate.bbox);
        let region = ImageUtils::resize_linear(&region, marker.width(), marker.height());
        let region_luma = ImageUtils::luminance(&region);

        let structural_similarity = structural_similarity(marker.luma(), &region_luma);
        let histogram_correlation = histogram_correlation(
            &luminance_histogram(marker.luma()),
            &luminance_histogram(&region_luma),
        );

        let accepted = candidate.score >= self.threshold
            && structural_similarity >= self.config.min_structural_similarity
            && histogram_correlation >= self.config.min_histogram_correlation;

        VerificationResult {
            structural_similarity,
            histogram_correlation,
            accepted,
        }
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(0.90, VerifyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use image::{Rgb, imageops};

    /// Bordered slot; `filled` puts a bright emblem in the middle
    fn slot(filled: bool) -> RgbImage {
        RgbImage::from_fn(24, 24, |x, y| {
            let border = x < 3 || y < 3 || x >= 21 || y >= 21;
            let emblem = filled && (8..16).contains(&x) && (6..18).contains(&y) && (x + y) % 3 != 0;
            if border {
                Rgb([160, 130, 60])
            } else if emblem {
                Rgb([240, 240, 250])
            } else {
                Rgb([20, 22, 28])
            }
        })
    }

    fn candidate(x: u32, y: u32, w: u32, h: u32, score: f64) -> MatchCandidate {
        MatchCandidate {
            marker: "slot".into(),
            score,
            scale: 1.0,
            bbox: BBox::new(x, y, w, h),
        }
    }

    #[test]
    fn test_exact_region_accepted() {
        let marker = Marker::new("slot", slot(true));
        let mut frame = RgbImage::from_pixel(60, 50, Rgb([5, 5, 5]));
        imageops::replace(&mut frame, &marker.image, 10, 12);

        let result = Verifier::default().verify(&marker, &frame, &candidate(10, 12, 24, 24, 0.999));
        assert!(result.accepted);
        assert!((result.structural_similarity - 1.0).abs() < 1e-9);
        assert!((result.histogram_correlation - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_slot_rejected() {
        let marker = Marker::new("slot", slot(true));
        let mut frame = RgbImage::from_pixel(60, 50, Rgb([5, 5, 5]));
        imageops::replace(&mut frame, &slot(false), 10, 12);

        let result = Verifier::default().verify(&marker, &frame, &candidate(10, 12, 24, 24, 0.95));
        assert!(!result.accepted);
        assert!(result.structural_similarity < 0.85);
    }

    #[test]
    fn test_low_score_rejected() {
        let marker = Marker::new("slot", slot(true));
        let mut frame = RgbImage::from_pixel(60, 50, Rgb([5, 5, 5]));
        imageops::replace(&mut frame, &marker.image, 0, 0);

        let result = Verifier::default().verify(&marker, &frame, &candidate(0, 0, 24, 24, 0.5));
        assert!(!result.accepted);
        assert!(result.structural_similarity > 0.99);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let marker = Marker::new("slot", slot(true));
        let frame = RgbImage::new(30, 30);
        let result = Verifier::default().verify(&marker, &frame, &candidate(20, 20, 24, 24, 1.0));
        assert_eq!(result, VerificationResult::rejected());
    }
}
