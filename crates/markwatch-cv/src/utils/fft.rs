//! Two-dimensional FFT over row-major planes
//!
//! Forward transforms leave the spectrum in column-major (transposed)
//! layout; `inverse` expects that layout back. Spectra are only ever
//! combined element-wise, so the layout never needs undoing in between.

use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

pub struct Fft2d {
    width: usize,
    height: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl Fft2d {
    /// Plan transforms for a `width x height` plane. Both sides must be non-zero.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "FFT plane must not be empty");
        let mut planner = FftPlanner::<f64>::new();

        Self {
            width,
            height,
            row_forward: planner.plan_fft_forward(width),
            row_inverse: planner.plan_fft_inverse(width),
            col_forward: planner.plan_fft_forward(height),
            col_inverse: planner.plan_fft_inverse(height),
        }
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forward transform of a real plane given row-major. Only the first
    /// `active_rows` rows may be non-zero, which saves the row pass on the
    /// zero padding of small templates.
    pub fn forward(&self, mut plane: Vec<Complex64>, active_rows: usize) -> Vec<Complex64> {
        debug_assert_eq!(plane.len(), self.len());
        let active = active_rows.min(self.height) * self.width;
        if active > 0 {
            self.row_forward.process(&mut plane[..active]);
        }

        let mut spectrum = transpose(&plane, self.width, self.height);
        self.col_forward.process(&mut spectrum);
        spectrum
    }

    /// Inverse transform of a transposed spectrum back to a real row-major plane
    pub fn inverse(&self, mut spectrum: Vec<Complex64>) -> Vec<f64> {
        debug_assert_eq!(spectrum.len(), self.len());
        self.col_inverse.process(&mut spectrum);

        let mut plane = transpose(&spectrum, self.height, self.width);
        self.row_inverse.process(&mut plane);

        let norm = 1.0 / self.len() as f64;
        plane.into_iter().map(|c| c.re * norm).collect()
    }
}

/// Transpose a row-major `width x height` buffer
fn transpose(data: &[Complex64], width: usize, height: usize) -> Vec<Complex64> {
    let mut out = vec![Complex64::new(0.0, 0.0); data.len()];
    for y in 0..height {
        let row = &data[y * width..(y + 1) * width];
        for (x, value) in row.iter().enumerate() {
            out[x * height + y] = *value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(values: &[f64]) -> Vec<Complex64> {
        values.iter().map(|&v| Complex64::new(v, 0.0)).collect()
    }

    #[test]
    fn test_forward_inverse_identity() {
        let values: Vec<f64> = (0..15).map(|v| (v * 7 % 11) as f64).collect();
        let fft = Fft2d::new(5, 3);

        let restored = fft.inverse(fft.forward(plane(&values), 3));
        for (a, b) in values.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_circular_cross_correlation() {
        // 4x3 image, 2x1 kernel [1, 2] at the origin
        let image: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let mut kernel = vec![0.0; 12];
        kernel[0] = 1.0;
        kernel[1] = 2.0;

        let fft = Fft2d::new(4, 3);
        let image_spec = fft.forward(plane(&image), 3);
        let kernel_spec = fft.forward(plane(&kernel), 1);
        let product = kernel_spec
            .iter()
            .zip(image_spec.iter())
            .map(|(k, i)| k.conj() * i)
            .collect();
        let corr = fft.inverse(product);

        // corr(x, y) = I(x, y) + 2 * I(x + 1, y) for non-wrapping positions
        for y in 0..3 {
            for x in 0..3 {
                let expected = image[y * 4 + x] + 2.0 * image[y * 4 + x + 1];
                assert!((corr[y * 4 + x] - expected).abs() < 1e-9);
            }
        }
    }
}
