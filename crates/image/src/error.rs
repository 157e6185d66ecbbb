//! Error types for the image crate.

use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur while inspecting image headers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// Unknown image format
    #[error("Unknown image format")]
    UnknownFormat,

    /// Format is recognised but its header carries no readable dimensions
    #[error("Dimensions unavailable for {0} images")]
    DimensionsUnsupported(&'static str),

    /// Invalid image data
    #[error("Invalid image data: {0}")]
    InvalidData(String),
}
