//! Marker templates and multi-scale localization

pub mod loader;
pub mod matcher;

pub use loader::{MarkerLoader, MarkerSource};
pub use matcher::{Localizer, PreparedFrame, locate};

use crate::error::MarkerError;
use crate::utils::ImageUtils;
use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Reference image of one visual event
#[derive(Debug, Clone)]
pub struct Marker {
    pub name: String,
    pub image: RgbImage,
    luma: GrayImage,
}

impl Marker {
    pub fn new(name: impl Into<String>, image: RgbImage) -> Self {
        let luma = ImageUtils::luminance(&image);
        Self {
            name: name.into(),
            image,
            luma,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Luminance of the unscaled image, used by verification
    pub fn luma(&self) -> &GrayImage {
        &self.luma
    }
}

/// Immutable collection of markers with unique names
#[derive(Debug, Clone)]
pub struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    pub fn new(markers: Vec<Marker>) -> Result<Self, MarkerError> {
        if markers.is_empty() {
            return Err(MarkerError::NoMarkers);
        }
        for (i, marker) in markers.iter().enumerate() {
            if markers[..i].iter().any(|m| m.name == marker.name) {
                return Err(MarkerError::DuplicateName(marker.name.clone()));
            }
        }
        Ok(Self { markers })
    }

    pub fn get(&self, name: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(|m| m.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Marker> {
        self.markers.iter()
    }

    pub fn as_slice(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl<'a> IntoIterator for &'a MarkerSet {
    type Item = &'a Marker;
    type IntoIter = std::slice::Iter<'a, Marker>;

    fn into_iter(self) -> Self::IntoIter {
        self.markers.iter()
    }
}

/// Ordered, duplicate-free scale factors within [`ScaleSet::MIN`, `ScaleSet::MAX`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct ScaleSet {
    factors: Vec<f64>,
}

impl ScaleSet {
    pub const MIN: f64 = 0.5;
    pub const MAX: f64 = 2.0;

    /// Keep the valid factors; fall back to `{1.0}` if none remain
    pub fn new(factors: impl IntoIterator<Item = f64>) -> Self {
        let mut kept: Vec<f64> = Vec::new();
        for factor in factors {
            let in_range = (Self::MIN..=Self::MAX).contains(&factor);
            if in_range && !kept.contains(&factor) {
                kept.push(factor);
            }
        }
        if kept.is_empty() {
            kept.push(1.0);
        }
        Self { factors: kept }
    }

    /// Parse a comma-separated list such as `"0.8,1.0,1.2"`.
    /// Any malformed entry invalidates the whole list.
    pub fn parse(list: &str) -> Self {
        let parsed: Result<Vec<f64>, _> = list
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::parse::<f64>)
            .collect();

        match parsed {
            Ok(values) => Self::new(values),
            Err(_) => Self::default(),
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.factors
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.factors.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

impl Default for ScaleSet {
    fn default() -> Self {
        Self { factors: vec![1.0] }
    }
}

impl From<Vec<f64>> for ScaleSet {
    fn from(factors: Vec<f64>) -> Self {
        Self::new(factors)
    }
}

impl From<ScaleSet> for Vec<f64> {
    fn from(scales: ScaleSet) -> Self {
        scales.factors
    }
}

/// Localization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Minimum correlation score for a candidate to be verified at all
    pub threshold: f64,
    pub scales: ScaleSet,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.90,
            scales: ScaleSet::default(),
        }
    }
}
