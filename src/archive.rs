//! Hit archive: one PNG plus a JSON record per appearance

use anyhow::Context;
use chrono::{DateTime, Local};
use image::RgbImage;
use markwatch_cv::{BBox, MarkerReport};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata written next to an archived frame
#[derive(Debug, Clone, Serialize)]
pub struct HitRecord<'a> {
    pub marker: &'a str,
    pub timestamp: String,
    pub score: Option<f64>,
    pub scale: Option<f64>,
    pub bbox: Option<BBox>,
    pub structural_similarity: Option<f64>,
    pub histogram_correlation: Option<f64>,
}

impl<'a> HitRecord<'a> {
    pub fn from_report(report: &'a MarkerReport, at: &DateTime<Local>) -> Self {
        Self {
            marker: &report.marker,
            timestamp: at.to_rfc3339(),
            score: report.candidate.as_ref().map(|c| c.score),
            scale: report.candidate.as_ref().map(|c| c.scale),
            bbox: report.candidate.as_ref().map(|c| c.bbox),
            structural_similarity: report.verification.map(|v| v.structural_similarity),
            histogram_correlation: report.verification.map(|v| v.histogram_correlation),
        }
    }
}

pub struct HitArchive {
    dir: PathBuf,
}

impl HitArchive {
    pub fn new(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create hit directory: {:?}", dir))?;
        Ok(Self { dir })
    }

    /// `{marker}_{YYYYMMDD_HHMMSS}`; hits within the same second share a name
    pub fn file_stem(marker: &str, at: &DateTime<Local>) -> String {
        format!("{}_{}", marker, at.format("%Y%m%d_%H%M%S"))
    }

    /// Write the frame the hit was verified on, plus its record.
    /// Returns the image path.
    pub fn store(
        &self,
        report: &MarkerReport,
        frame: &RgbImage,
        at: &DateTime<Local>,
    ) -> anyhow::Result<PathBuf> {
        let stem = Self::file_stem(&report.marker, at);
        let image_path = self.dir.join(format!("{}.png", stem));
        let record_path = self.dir.join(format!("{}.json", stem));

        frame
            .save(&image_path)
            .with_context(|| format!("Failed to save hit image: {:?}", image_path))?;

        let json = serde_json::to_string_pretty(&HitRecord::from_report(report, at))
            .context("Failed to serialize hit record")?;
        fs::write(&record_path, json)
            .with_context(|| format!("Failed to write hit record: {:?}", record_path))?;

        Ok(image_path)
    }
}
