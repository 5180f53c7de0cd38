//! Windowed structural similarity on luminance images

use crate::utils::IntegralImage;
use image::GrayImage;

const WINDOW: u32 = 7;
const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// Mean SSIM over all uniform 7x7 windows lying fully inside both images,
/// using sample (co)variances. Smaller images use the largest odd window
/// that fits; below 3 pixels a single global window is used.
pub fn structural_similarity(a: &GrayImage, b: &GrayImage) -> f64 {
    let width = a.width().min(b.width());
    let height = a.height().min(b.height());
    if width == 0 || height == 0 {
        return 0.0;
    }

    let side = width.min(height);
    if side < 3 {
        return global_ssim(a, b, width, height);
    }
    let window = if side >= WINDOW { WINDOW } else if side % 2 == 1 { side } else { side - 1 };

    let at = |img: &GrayImage, x: u32, y: u32| img.get_pixel(x, y)[0] as f64;
    let sum_a = IntegralImage::from_fn(width, height, |x, y| at(a, x, y));
    let sum_b = IntegralImage::from_fn(width, height, |x, y| at(b, x, y));
    let sum_aa = IntegralImage::from_fn(width, height, |x, y| at(a, x, y).powi(2));
    let sum_bb = IntegralImage::from_fn(width, height, |x, y| at(b, x, y).powi(2));
    let sum_ab = IntegralImage::from_fn(width, height, |x, y| at(a, x, y) * at(b, x, y));

    let n = (window * window) as f64;
    let cov_norm = n / (n - 1.0);

    let mut total = 0.0;
    let mut count = 0usize;
    for y in 0..=(height - window) {
        for x in 0..=(width - window) {
            let ux = sum_a.window_sum(x, y, window, window) / n;
            let uy = sum_b.window_sum(x, y, window, window) / n;
            let uxx = sum_aa.window_sum(x, y, window, window) / n;
            let uyy = sum_bb.window_sum(x, y, window, window) / n;
            let uxy = sum_ab.window_sum(x, y, window, window) / n;

            let vx = cov_norm * (uxx - ux * ux);
            let vy = cov_norm * (uyy - uy * uy);
            let vxy = cov_norm * (uxy - ux * uy);

            total += ssim_index(ux, uy, vx, vy, vxy);
            count += 1;
        }
    }

    total / count as f64
}

fn global_ssim(a: &GrayImage, b: &GrayImage, width: u32, height: u32) -> f64 {
    let n = (width * height) as f64;
    let (mut sa, mut sb, mut saa, mut sbb, mut sab) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for y in 0..height {
        for x in 0..width {
            let va = a.get_pixel(x, y)[0] as f64;
            let vb = b.get_pixel(x, y)[0] as f64;
            sa += va;
            sb += vb;
            saa += va * va;
            sbb += vb * vb;
            sab += va * vb;
        }
    }

    let (ux, uy) = (sa / n, sb / n);
    ssim_index(ux, uy, saa / n - ux * ux, sbb / n - uy * uy, sab / n - ux * uy)
}

fn ssim_index(ux: f64, uy: f64, vx: f64, vy: f64, vxy: f64) -> f64 {
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    ((2.0 * ux * uy + c1) * (2.0 * vxy + c2)) / ((ux * ux + uy * uy + c1) * (vx + vy + c2))
}
