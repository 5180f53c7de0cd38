//! Image loading, conversion and resampling helpers

use crate::Result;
use crate::bbox::BBox;
use anyhow::Context;
use image::buffer::ConvertBuffer;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage, RgbaImage};
use std::path::Path;

/// Image utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Load image as 3-channel color, discarding any alpha channel
    pub fn load_color<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
        let img = image::open(&path)
            .with_context(|| format!("Failed to open image: {:?}", path.as_ref()))?;
        Ok(img.to_rgb8())
    }

    /// Drop the alpha channel of a captured frame
    pub fn strip_alpha(rgba_image: &RgbaImage) -> RgbImage {
        rgba_image.convert()
    }

    /// BT.601 luma: 0.299 R + 0.587 G + 0.114 B, rounded
    pub fn luminance(img: &RgbImage) -> GrayImage {
        GrayImage::from_fn(img.width(), img.height(), |x, y| {
            let p = img.get_pixel(x, y);
            let v = 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64;
            Luma([v.round().min(255.0) as u8])
        })
    }

    /// Copy out a sub-region; the box is clamped to the image bounds
    pub fn crop(img: &RgbImage, bbox: &BBox) -> RgbImage {
        imageops::crop_imm(img, bbox.x, bbox.y, bbox.width, bbox.height).to_image()
    }

    /// Target size of `width x height` scaled by `scale`
    pub fn scaled_size(width: u32, height: u32, scale: f64) -> (u32, u32) {
        let w = (width as f64 * scale).round().max(0.0) as u32;
        let h = (height as f64 * scale).round().max(0.0) as u32;
        (w, h)
    }

    /// Scale a template: area averaging when shrinking, cubic when growing.
    /// Returns `None` when the scaled size collapses below one pixel.
    pub fn scale_template(template: &RgbImage, scale: f64) -> Option<RgbImage> {
        let (width, height) = Self::scaled_size(template.width(), template.height(), scale);
        if width < 1 || height < 1 {
            return None;
        }

        if (scale - 1.0).abs() < f64::EPSILON {
            Some(template.clone())
        } else if scale < 1.0 {
            Some(Self::resize_area(template, width, height))
        } else {
            Some(imageops::resize(template, width, height, FilterType::CatmullRom))
        }
    }

    /// Bilinear resize on pixel centers, two taps per axis and no
    /// prefilter, so shrinking samples instead of blurring.
    /// No-op when the size already matches.
    pub fn resize_linear(img: &RgbImage, width: u32, height: u32) -> RgbImage {
        let (src_w, src_h) = img.dimensions();
        if (src_w, src_h) == (width, height) {
            return img.clone();
        }
        if src_w == 0 || src_h == 0 || width == 0 || height == 0 {
            return RgbImage::new(width, height);
        }

        let x_taps = linear_taps(src_w, width);
        let y_taps = linear_taps(src_h, height);

        RgbImage::from_fn(width, height, |x, y| {
            let (x0, x1, fx) = x_taps[x as usize];
            let (y0, y1, fy) = y_taps[y as usize];
            let (tl, tr) = (img.get_pixel(x0, y0), img.get_pixel(x1, y0));
            let (bl, br) = (img.get_pixel(x0, y1), img.get_pixel(x1, y1));

            Rgb(std::array::from_fn(|c| {
                let top = tl[c] as f64 * (1.0 - fx) + tr[c] as f64 * fx;
                let bottom = bl[c] as f64 * (1.0 - fx) + br[c] as f64 * fx;
                (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
            }))
        })
    }

    /// Resample by averaging every source pixel the destination pixel covers,
    /// weighted by the covered fraction.
    pub fn resize_area(img: &RgbImage, width: u32, height: u32) -> RgbImage {
        let (src_w, src_h) = img.dimensions();
        if (src_w, src_h) == (width, height) {
            return img.clone();
        }
        if src_w == 0 || src_h == 0 || width == 0 || height == 0 {
            return RgbImage::new(width, height);
        }

        let x_weights = area_weights(src_w, width);
        let y_weights = area_weights(src_h, height);

        let mut out = RgbImage::new(width, height);
        for (oy, ys) in y_weights.iter().enumerate() {
            for (ox, xs) in x_weights.iter().enumerate() {
                let mut acc = [0.0f64; 3];
                for &(sy, wy) in ys {
                    for &(sx, wx) in xs {
                        let p = img.get_pixel(sx, sy);
                        let w = wx * wy;
                        acc[0] += p[0] as f64 * w;
                        acc[1] += p[1] as f64 * w;
                        acc[2] += p[2] as f64 * w;
                    }
                }
                out.put_pixel(
                    ox as u32,
                    oy as u32,
                    Rgb(acc.map(|v| v.round().clamp(0.0, 255.0) as u8)),
                );
            }
        }

        out
    }
}

/// For every destination index, the two neighbouring source indices and the
/// weight of the second. Source position is `(i + 0.5) * ratio - 0.5`,
/// clamped to the edge pixels.
fn linear_taps(src_len: u32, dst_len: u32) -> Vec<(u32, u32, f64)> {
    let ratio = src_len as f64 / dst_len as f64;
    let last = src_len - 1;

    (0..dst_len)
        .map(|i| {
            let pos = (i as f64 + 0.5) * ratio - 0.5;
            let left = pos.floor();
            if left < 0.0 {
                (0, 0, 0.0)
            } else if left as u32 >= last {
                (last, last, 0.0)
            } else {
                (left as u32, left as u32 + 1, pos - left)
            }
        })
        .collect()
}

/// For every destination index, the source indices it covers and their weights
fn area_weights(src_len: u32, dst_len: u32) -> Vec<Vec<(u32, f64)>> {
    let ratio = src_len as f64 / dst_len as f64;

    (0..dst_len)
        .map(|i| {
            let start = i as f64 * ratio;
            let end = ((i + 1) as f64 * ratio).min(src_len as f64);
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src_len);

            let mut weights: Vec<(u32, f64)> = (first..last)
                .filter_map(|k| {
                    let overlap = end.min(k as f64 + 1.0) - start.max(k as f64);
                    (overlap > 1e-12).then_some((k, overlap))
                })
                .collect();

            let total: f64 = weights.iter().map(|&(_, w)| w).sum();
            if total > 0.0 {
                for (_, w) in weights.iter_mut() {
                    *w /= total;
                }
            }
            weights
        })
        .collect()
}
