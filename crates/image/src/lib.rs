//! Header-only image inspection.
//!
//! This crate provides:
//! - Format detection from magic bytes
//! - Pixel dimensions read straight from the file header, without decoding
//!
//! Both work on a prefix of the file, so callers can read a small byte range
//! from remote storage instead of the whole object.

#![warn(missing_docs)]

mod detect;
mod error;
mod metadata;

pub use detect::{ImageFormat, detect_format};
pub use error::{ImageError, Result};
pub use metadata::{ImageMetadata, MIN_HEADER_BYTES, extract_metadata, read_dimensions};
