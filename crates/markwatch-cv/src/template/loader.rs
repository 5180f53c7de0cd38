//! Marker loading from a single file or a directory

use super::{Marker, MarkerSet};
use crate::Result;
use crate::error::MarkerError;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where markers come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerSource {
    File(PathBuf),
    Directory(PathBuf),
}

/// Marker loader
pub struct MarkerLoader {
    supported_extensions: Vec<String>,
}

impl MarkerLoader {
    /// Create new marker loader accepting PNG files
    pub fn new() -> Self {
        Self {
            supported_extensions: vec!["png".to_string()],
        }
    }

    pub fn load(&self, source: &MarkerSource) -> Result<MarkerSet> {
        let set = match source {
            MarkerSource::File(path) => self.load_file(path)?,
            MarkerSource::Directory(dir) => self.load_dir(dir)?,
        };

        info!(
            markers = ?set.names().collect::<Vec<_>>(),
            "markers loaded"
        );
        Ok(set)
    }

    /// Load exactly one marker; any failure is fatal
    pub fn load_file(&self, path: &Path) -> Result<MarkerSet> {
        if !path.is_file() {
            return Err(MarkerError::NotFound(path.to_path_buf()).into());
        }

        let marker = Self::read_marker(path)?;
        Ok(MarkerSet::new(vec![marker])?)
    }

    /// Load every supported image in `dir`, in file-name order.
    /// Images that fail to decode are skipped.
    pub fn load_dir(&self, dir: &Path) -> Result<MarkerSet> {
        if !dir.is_dir() {
            return Err(MarkerError::InvalidDirectory(dir.to_path_buf()).into());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {:?}", dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && self.is_supported(path))
            .collect();
        paths.sort();

        let mut markers = Vec::new();
        for path in paths {
            match Self::read_marker(&path) {
                Ok(marker) => markers.push(marker),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping marker"),
            }
        }

        if markers.is_empty() {
            return Err(MarkerError::Empty(dir.to_path_buf()).into());
        }
        Ok(MarkerSet::new(markers)?)
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.supported_extensions.contains(&ext))
    }

    fn read_marker(path: &Path) -> std::result::Result<Marker, MarkerError> {
        let image = image::open(path)
            .map_err(|source| MarkerError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();

        Ok(Marker::new(marker_name(path), image))
    }
}

impl Default for MarkerLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Marker name for an image path: the file stem
pub fn marker_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Normalize a user-supplied marker name, accepting an optional `.png` suffix
pub fn normalize_marker_name(name: &str) -> String {
    let trimmed = name.trim();
    match trimmed.len().checked_sub(4) {
        Some(cut) if trimmed.is_char_boundary(cut) && trimmed[cut..].eq_ignore_ascii_case(".png") => {
            trimmed[..cut].to_string()
        }
        _ => trimmed.to_string(),
    }
}
