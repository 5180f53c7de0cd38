//! Live window capture

use crate::source::{CaptureError, FrameSource};
use anyhow::{anyhow, Context};
use image::RgbImage;
use markwatch_cv::utils::ImageUtils;
use tracing::info;
use xcap::Window;

/// Summary of a capturable window
#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub id: u32,
    pub title: String,
    pub app_name: String,
    pub width: u32,
    pub height: u32,
}

impl WindowInfo {
    fn of(window: &Window) -> Option<Self> {
        Some(Self {
            id: window.id().ok()?,
            title: window.title().unwrap_or_default(),
            app_name: window.app_name().unwrap_or_default(),
            width: window.width().unwrap_or_default(),
            height: window.height().unwrap_or_default(),
        })
    }
}

fn visible_windows() -> anyhow::Result<Vec<(Window, WindowInfo)>> {
    let windows = Window::all().map_err(|e| anyhow!("Failed to enumerate windows: {}", e))?;

    Ok(windows
        .into_iter()
        .filter(|w| !w.is_minimized().unwrap_or(true))
        .filter_map(|w| WindowInfo::of(&w).map(|info| (w, info)))
        .collect())
}

pub fn list_windows() -> anyhow::Result<Vec<WindowInfo>> {
    Ok(visible_windows()?.into_iter().map(|(_, info)| info).collect())
}

/// Captures one window; reports `Closed` once it no longer exists
pub struct WindowSource {
    window: Window,
    info: WindowInfo,
}

impl WindowSource {
    /// Pick the first visible window whose title contains `title`, falling
    /// back to one whose process name contains `process`
    pub fn find(title: Option<&str>, process: Option<&str>) -> anyhow::Result<Self> {
        if title.is_none() && process.is_none() {
            anyhow::bail!("no window selector: use --title <text> or --proc <name>");
        }

        let windows = visible_windows()?;
        let find_by = |needle: Option<&str>, field: fn(&WindowInfo) -> &str| {
            let needle = needle?.to_lowercase();
            windows
                .iter()
                .position(|(_, info)| field(info).to_lowercase().contains(&needle))
        };

        let index = find_by(title, |info| info.title.as_str())
            .or_else(|| find_by(process, |info| info.app_name.as_str()))
            .context("no matching window found; try --title or --proc")?;

        let (window, info) = windows.into_iter().nth(index).context("window vanished")?;
        info!(
            id = info.id,
            title = %info.title,
            app = %info.app_name,
            size = %format!("{}x{}", info.width, info.height),
            "window selected"
        );

        Ok(Self { window, info })
    }

    fn still_open(&self) -> bool {
        Window::all()
            .map(|all| all.iter().any(|w| w.id().ok() == Some(self.info.id)))
            .unwrap_or(false)
    }
}

impl FrameSource for WindowSource {
    fn describe(&self) -> String {
        format!("window '{}' ({})", self.info.title, self.info.app_name)
    }

    fn grab(&mut self) -> Result<RgbImage, CaptureError> {
        if !self.still_open() {
            return Err(CaptureError::Closed);
        }

        let rgba = self
            .window
            .capture_image()
            .map_err(|e| CaptureError::Frame(anyhow!("window capture failed: {}", e)))?;
        Ok(ImageUtils::strip_alpha(&rgba))
    }
}
