//! Frame sources

use anyhow::Context;
use image::RgbImage;
use markwatch_cv::utils::ImageUtils;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The source is gone for good; the pipeline should stop.
    #[error("capture target closed")]
    Closed,
    /// This frame could not be acquired or decoded; later frames may still work.
    #[error("frame unavailable: {0:#}")]
    Frame(#[source] anyhow::Error),
}

/// Produces color frames on demand
pub trait FrameSource {
    fn describe(&self) -> String;
    fn grab(&mut self) -> Result<RgbImage, CaptureError>;
}

/// Replays the PNG frames of a directory in file-name order, then closes
pub struct ReplaySource {
    dir: PathBuf,
    frames: VecDeque<PathBuf>,
}

impl ReplaySource {
    pub fn new(dir: &Path) -> anyhow::Result<Self> {
        let mut frames: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Failed to read replay directory: {:?}", dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        frames.sort();

        if frames.is_empty() {
            anyhow::bail!("no PNG frames in replay directory {:?}", dir);
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            frames: frames.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    fn describe(&self) -> String {
        format!("replay of {} ({} frames)", self.dir.display(), self.remaining())
    }

    fn grab(&mut self) -> Result<RgbImage, CaptureError> {
        let path = self.frames.pop_front().ok_or(CaptureError::Closed)?;
        ImageUtils::load_color(&path).map_err(CaptureError::Frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbaImage};

    #[test]
    fn test_replay_order_and_errors() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("markwatch-replay-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir)?;

        RgbImage::from_pixel(4, 4, Rgb([1, 1, 1])).save(dir.join("001.png"))?;
        fs::write(dir.join("002.png"), "corrupt")?;
        RgbaImage::from_pixel(4, 4, image::Rgba([3, 3, 3, 7])).save(dir.join("003.png"))?;
        fs::write(dir.join("readme.txt"), "ignored")?;

        let mut source = ReplaySource::new(&dir)?;
        assert_eq!(source.remaining(), 3);

        assert_eq!(source.grab().unwrap().get_pixel(0, 0), &Rgb([1, 1, 1]));
        assert!(matches!(source.grab(), Err(CaptureError::Frame(_))));
        assert_eq!(source.grab().unwrap().get_pixel(0, 0), &Rgb([3, 3, 3]));
        assert!(matches!(source.grab(), Err(CaptureError::Closed)));

        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_empty_replay_dir() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("markwatch-replay-empty-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir)?;
        assert!(ReplaySource::new(&dir).is_err());
        fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
