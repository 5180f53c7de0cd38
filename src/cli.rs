//! Command-line surface

use anyhow::bail;
use clap::Parser;
use markwatch_cv::{DetectionConfig, MarkerSource, ScaleSet};
use std::path::PathBuf;
use std::time::Duration;

/// Lowest effective processing rate
const MIN_FPS: f64 = 0.1;

#[derive(Debug, Parser)]
#[command(name = "markwatch")]
#[command(about = "Watch an application window for known visual markers and alert on changes")]
#[command(version)]
#[command(after_help = "Live window capture needs a build with `--features window-capture`; \
without it, frames can only come from --replay <dir>.")]
pub struct Cli {
    /// Select the window whose title contains this text (case-insensitive).
    #[arg(long)]
    pub title: Option<String>,

    /// Select the window whose process name contains this text; used when
    /// no title is given or no window matches it.
    #[arg(long = "proc")]
    pub process: Option<String>,

    /// Single marker image (PNG).
    #[arg(long, conflicts_with = "items")]
    pub template: Option<PathBuf>,

    /// Directory whose PNG files are all markers.
    #[arg(long)]
    pub items: Option<PathBuf>,

    /// Minimum correlation score for a candidate match.
    #[arg(long, default_value_t = 0.90)]
    pub threshold: f64,

    /// Target processing rate in frames per second.
    #[arg(long, default_value_t = 1.0)]
    pub fps: f64,

    /// Directory for archived hit frames.
    #[arg(long, default_value = "hits")]
    pub hits: PathBuf,

    /// Comma-separated marker scale factors within [0.5, 2.0].
    #[arg(long, default_value = "1.00")]
    pub scales: String,

    /// Marker whose disappearance after being seen raises an adverse alert.
    #[arg(long)]
    pub hold_marker: Option<String>,

    /// Replay the PNG frames of a directory instead of capturing a window.
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// List capturable windows and exit.
    #[arg(long)]
    pub list_windows: bool,

    /// Diagnostic logging (per-frame misses and holds).
    #[arg(long, visible_alias = "debug")]
    pub verbose: bool,
}

impl Cli {
    pub fn marker_source(&self) -> anyhow::Result<MarkerSource> {
        match (&self.template, &self.items) {
            (Some(file), _) => Ok(MarkerSource::File(file.clone())),
            (None, Some(dir)) => Ok(MarkerSource::Directory(dir.clone())),
            (None, None) => bail!("no marker source: use --template <png> or --items <dir>"),
        }
    }

    pub fn detection_config(&self) -> DetectionConfig {
        DetectionConfig::default()
            .with_threshold(self.threshold)
            .with_scales(ScaleSet::parse(&self.scales))
            .with_hold_marker(self.hold_marker.clone())
    }

    /// Minimum time between two processed frames
    pub fn period(&self) -> Duration {
        period_for(self.fps)
    }
}

pub fn period_for(fps: f64) -> Duration {
    let fps = if fps.is_finite() { fps.max(MIN_FPS) } else { MIN_FPS };
    Duration::from_secs_f64(1.0 / fps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["markwatch", "--title", "MU", "--items", "items"]).unwrap();
        assert_eq!(cli.threshold, 0.90);
        assert_eq!(cli.period(), Duration::from_secs(1));
        assert_eq!(cli.hits, PathBuf::from("hits"));
        assert_eq!(cli.marker_source().unwrap(), MarkerSource::Directory("items".into()));

        let config = cli.detection_config();
        assert_eq!(config.matching.scales.as_slice(), &[1.0]);
        assert!(config.hold_marker.is_none());
    }

    #[test]
    fn test_help_mentions_capture_feature() {
        let help = Cli::command().get_after_help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("--features window-capture"));
        assert!(help.contains("--replay"));
    }

    #[test]
    fn test_template_and_items_conflict() {
        let parsed = Cli::try_parse_from(["markwatch", "--template", "a.png", "--items", "dir"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_missing_marker_source() {
        let cli = Cli::try_parse_from(["markwatch", "--title", "MU"]).unwrap();
        assert!(cli.marker_source().is_err());
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "markwatch",
            "--proc",
            "main.exe",
            "--template",
            "bell.png",
            "--scales",
            "0.8,abc",
            "--fps",
            "0",
            "--hold-marker",
            "shield",
            "--debug",
        ])
        .unwrap();

        assert_eq!(cli.process.as_deref(), Some("main.exe"));
        assert!(cli.verbose);
        assert_eq!(cli.period(), Duration::from_secs(10));
        let config = cli.detection_config();
        assert_eq!(config.matching.scales.as_slice(), &[1.0]);
        assert_eq!(config.hold_marker.as_deref(), Some("shield"));
    }
}
