//! Expected configuration failures

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("marker image does not exist: {0}")]
    NotFound(PathBuf),

    #[error("marker directory is invalid: {0}")]
    InvalidDirectory(PathBuf),

    #[error("failed to read marker image {path}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no marker images loaded from {0}")]
    Empty(PathBuf),

    #[error("marker set is empty")]
    NoMarkers,

    #[error("duplicate marker name: {0}")]
    DuplicateName(String),

    #[error("hold marker '{0}' is not part of the marker set")]
    UnknownHoldMarker(String),
}
