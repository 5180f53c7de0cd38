//! Luminance histogram comparison

use image::GrayImage;

pub type Histogram = [f64; 256];

/// 256-bin luminance histogram
pub fn luminance_histogram(img: &GrayImage) -> Histogram {
    let mut hist = [0.0; 256];
    for p in img.pixels() {
        hist[p[0] as usize] += 1.0;
    }
    hist
}

/// Pearson correlation between two histograms, in [-1, 1].
/// Scale-invariant, so unnormalized counts compare directly.
pub fn histogram_correlation(a: &Histogram, b: &Histogram) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let (mut cross, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (va, vb) in a.iter().zip(b.iter()) {
        let da = va - mean_a;
        let db = vb - mean_b;
        cross += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denominator = (var_a * var_b).sqrt();
    if denominator <= f64::EPSILON {
        return if var_a <= f64::EPSILON && var_b <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    (cross / denominator).clamp(-1.0, 1.0)
}
