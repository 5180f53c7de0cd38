//! Utility modules

pub mod fft;
pub mod image;
pub mod integral;

pub use fft::Fft2d;
pub use self::image::ImageUtils;
pub use integral::IntegralImage;
