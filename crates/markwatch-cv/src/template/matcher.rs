//! Multi-scale template localization with normalized correlation coefficients
//!
//! Scores follow the zero-mean normalized cross-correlation used by
//! `TM_CCOEFF_NORMED`: per channel, template and window are mean-subtracted,
//! and the cross term and both energies are summed over all three channels.
//! The cross term is computed for every placement at once in the frequency
//! domain; window energies come from summed-area tables.

use super::{Marker, ScaleSet};
use crate::bbox::{BBox, MatchCandidate};
use crate::utils::{Fft2d, ImageUtils, IntegralImage};
use image::RgbImage;
use rustfft::num_complex::Complex64;
use tracing::trace;

const CHANNELS: usize = 3;

/// Frame spectra and window statistics, computed once and shared by every
/// marker and scale matched against the same frame
pub struct PreparedFrame<'a> {
    frame: &'a RgbImage,
    planes: Option<FramePlanes>,
}

struct FramePlanes {
    fft: Fft2d,
    spectra: [Vec<Complex64>; CHANNELS],
    sums: [IntegralImage; CHANNELS],
    squares: [IntegralImage; CHANNELS],
}

impl<'a> PreparedFrame<'a> {
    pub fn new(frame: &'a RgbImage) -> Self {
        let (width, height) = frame.dimensions();
        let planes = (width > 0 && height > 0).then(|| FramePlanes::new(frame));
        Self { frame, planes }
    }

    pub fn frame(&self) -> &'a RgbImage {
        self.frame
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }
}

impl FramePlanes {
    fn new(frame: &RgbImage) -> Self {
        let (width, height) = frame.dimensions();
        let fft = Fft2d::new(width as usize, height as usize);

        let channel_plane = |c: usize| -> Vec<Complex64> {
            frame
                .pixels()
                .map(|p| Complex64::new(p[c] as f64, 0.0))
                .collect()
        };

        let spectra = std::array::from_fn(|c| fft.forward(channel_plane(c), height as usize));
        let sums = std::array::from_fn(|c| {
            IntegralImage::from_fn(width, height, |x, y| frame.get_pixel(x, y)[c] as f64)
        });
        let squares = std::array::from_fn(|c| {
            IntegralImage::from_fn(width, height, |x, y| {
                let v = frame.get_pixel(x, y)[c] as f64;
                v * v
            })
        });

        Self {
            fft,
            spectra,
            sums,
            squares,
        }
    }
}

/// Best placement of a single-scale template
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScaleMatch {
    score: f64,
    x: u32,
    y: u32,
}

/// Multi-scale localizer
pub struct Localizer;

impl Localizer {
    /// Find the best-scoring placement of `marker` across all `scales`.
    ///
    /// Scales whose template is empty or larger than the frame are skipped;
    /// returns `None` when no scaled template fits the frame.
    pub fn locate(
        prepared: &PreparedFrame<'_>,
        marker: &Marker,
        scales: &ScaleSet,
    ) -> Option<MatchCandidate> {
        let planes = prepared.planes.as_ref()?;
        let (frame_w, frame_h) = prepared.frame.dimensions();

        let mut best: Option<MatchCandidate> = None;
        for scale in scales.iter() {
            let Some(template) = ImageUtils::scale_template(&marker.image, scale) else {
                continue;
            };
            let (tw, th) = template.dimensions();
            if tw > frame_w || th > frame_h {
                continue;
            }

            let found = Self::match_scale(planes, frame_w, frame_h, &template);
            trace!(marker = %marker.name, scale, score = found.score, "scale matched");

            if best.as_ref().is_none_or(|b| found.score > b.score) {
                best = Some(MatchCandidate {
                    marker: marker.name.clone(),
                    score: found.score,
                    scale,
                    bbox: BBox::new(found.x, found.y, tw, th),
                });
            }
        }

        best
    }

    /// Global maximum of the correlation surface for one template.
    /// A flat template has no structure to correlate and scores 0 at the origin.
    fn match_scale(
        planes: &FramePlanes,
        frame_w: u32,
        frame_h: u32,
        template: &RgbImage,
    ) -> ScaleMatch {
        let (tw, th) = template.dimensions();
        let area = (tw * th) as f64;
        let width = frame_w as usize;

        let mut means = [0.0f64; CHANNELS];
        for p in template.pixels() {
            for c in 0..CHANNELS {
                means[c] += p[c] as f64;
            }
        }
        means.iter_mut().for_each(|m| *m /= area);

        let mut template_energy = 0.0;
        for p in template.pixels() {
            for c in 0..CHANNELS {
                let d = p[c] as f64 - means[c];
                template_energy += d * d;
            }
        }
        if template_energy <= f64::EPSILON * area {
            return ScaleMatch { score: 0.0, x: 0, y: 0 };
        }
        let template_norm = template_energy.sqrt();

        // Sum of conj(T_c) * I_c over channels; the template is zero-mean, so
        // the cross term against raw frame values equals the centered one.
        let mut product = vec![Complex64::new(0.0, 0.0); planes.fft.len()];
        for c in 0..CHANNELS {
            let mut plane = vec![Complex64::new(0.0, 0.0); planes.fft.len()];
            for (x, y, p) in template.enumerate_pixels() {
                plane[y as usize * width + x as usize] = Complex64::new(p[c] as f64 - means[c], 0.0);
            }
            let spectrum = planes.fft.forward(plane, th as usize);
            for (acc, (t, i)) in product
                .iter_mut()
                .zip(spectrum.iter().zip(planes.spectra[c].iter()))
            {
                *acc += t.conj() * i;
            }
        }
        let cross = planes.fft.inverse(product);

        let mut best = ScaleMatch {
            score: f64::NEG_INFINITY,
            x: 0,
            y: 0,
        };
        for y in 0..=(frame_h - th) {
            for x in 0..=(frame_w - tw) {
                let mut window_sq = 0.0;
                let mut window_mean_sq = 0.0;
                for c in 0..CHANNELS {
                    let s = planes.sums[c].window_sum(x, y, tw, th);
                    window_sq += planes.squares[c].window_sum(x, y, tw, th);
                    window_mean_sq += s * s / area;
                }

                let numerator = cross[y as usize * width + x as usize];
                let score = normalize_score(numerator, window_sq, window_mean_sq, template_norm);

                if score > best.score {
                    best = ScaleMatch { score, x, y };
                }
            }
        }

        best
    }
}

/// Turn a raw cross term into a coefficient in [-1, 1]. Windows whose
/// variance vanishes under rounding score 0; numerators that overshoot the
/// denominator slightly are clamped to +-1.
fn normalize_score(numerator: f64, window_sq: f64, window_mean_sq: f64, template_norm: f64) -> f64 {
    let variance = (window_sq - window_mean_sq).max(0.0);
    let denominator = if variance <= (10.0 * f32::EPSILON as f64 * window_sq).min(0.5) {
        0.0
    } else {
        variance.sqrt() * template_norm
    };

    if numerator.abs() < denominator {
        numerator / denominator
    } else if numerator.abs() < denominator * 1.125 {
        numerator.signum()
    } else {
        0.0
    }
}

/// Prepare `frame` and locate a single marker in it
pub fn locate(frame: &RgbImage, marker: &Marker, scales: &ScaleSet) -> Option<MatchCandidate> {
    Localizer::locate(&PreparedFrame::new(frame), marker, scales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, imageops};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(width: u32, height: u32, seed: u64) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(seed);
        RgbImage::from_fn(width, height, |_, _| {
            Rgb([
                rng.gen_range(0..=255),
                rng.gen_range(0..=255),
                rng.gen_range(0..=255),
            ])
        })
    }

    fn patterned_marker(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let ring = ((x as i32 - width as i32 / 2).pow(2) + (y as i32 - height as i32 / 2).pow(2)) % 37;
            Rgb([(x * 17 % 256) as u8, (ring * 6) as u8, (y * 23 % 256) as u8])
        })
    }

    #[test]
    fn test_exact_copy_is_found() {
        let marker = Marker::new("bell", noise(12, 9, 7));
        let mut frame = noise(80, 60, 11);
        imageops::replace(&mut frame, &marker.image, 37, 21);

        let candidate = locate(&frame, &marker, &ScaleSet::default()).expect("candidate");
        assert_eq!(candidate.bbox.top_left(), (37, 21));
        assert_eq!(candidate.bbox.size(), (12, 9));
        assert!(candidate.score > 0.99, "score {}", candidate.score);
        assert_eq!(candidate.marker, "bell");
    }

    #[test]
    fn test_solid_frame_scores_low() {
        let marker = Marker::new("bell", patterned_marker(10, 10));
        let frame = RgbImage::from_pixel(64, 48, Rgb([90, 120, 30]));

        let best = locate(&frame, &marker, &ScaleSet::parse("0.8,1.0,1.2"));
        assert!(best.is_none_or(|c| c.score < 0.90));
    }

    #[test]
    fn test_best_scale_wins() {
        let marker = Marker::new("chest", patterned_marker(10, 8));
        let enlarged = ImageUtils::scale_template(&marker.image, 2.0).unwrap();
        let mut frame = noise(96, 72, 3);
        imageops::replace(&mut frame, &enlarged, 30, 25);

        let candidate = locate(&frame, &marker, &ScaleSet::parse("1.0,2.0")).unwrap();
        assert_eq!(candidate.scale, 2.0);
        assert_eq!(candidate.bbox, BBox::new(30, 25, 20, 16));
        assert!(candidate.score > 0.99);
    }

    #[test]
    fn test_template_larger_than_frame() {
        let marker = Marker::new("big", noise(40, 40, 1));
        let frame = noise(30, 50, 2);
        assert!(locate(&frame, &marker, &ScaleSet::parse("1.0,1.5")).is_none());

        // Shrinking makes it fit
        let candidate = locate(&frame, &marker, &ScaleSet::parse("0.5,1.0"));
        assert_eq!(candidate.map(|c| c.bbox.size()), Some((20, 20)));
    }

    #[test]
    fn test_flat_window_scores_zero() {
        assert_eq!(normalize_score(5.0, 100.0, 100.0, 3.0), 0.0);
        assert!((normalize_score(6.0, 104.0, 100.0, 3.0) - 1.0).abs() < 1e-12);
        assert!((normalize_score(-3.0, 104.0, 100.0, 3.0) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_flat_marker_scores_zero() {
        let marker = Marker::new("blank", RgbImage::from_pixel(6, 6, Rgb([50, 60, 70])));
        let frame = noise(40, 30, 5);

        let candidate = locate(&frame, &marker, &ScaleSet::default()).expect("candidate");
        assert_eq!(candidate.score, 0.0);
        assert_eq!(candidate.bbox, BBox::new(0, 0, 6, 6));
    }

    #[test]
    fn test_empty_frame() {
        let marker = Marker::new("bell", noise(4, 4, 1));
        assert!(locate(&RgbImage::new(0, 0), &marker, &ScaleSet::default()).is_none());
    }
}
