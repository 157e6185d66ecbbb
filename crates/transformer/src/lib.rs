//! Client-side builder for image-transformation URLs.
//!
//! This crate turns a reference to an image in S3 plus a chain of edits
//! (resize, background, format, quality) into one opaque URL for a remote
//! image-processing service. The URL carries the recipe as base64url-encoded
//! JSON; no pixels are processed locally.
//!
//! # Features
//!
//! - **Reference parsing**: virtual-hosted and path-style S3 URLs, or bare keys
//! - **Deterministic encoding**: identical call chains give byte-identical URLs
//! - **Dimension inference**: a zero resize side is derived from the origin
//!   image's aspect ratio, read from a ranged fetch of its header
//! - **Single-flight cache**: the origin is fetched at most once per builder
//!
//! # Example
//!
//! ```rust,no_run
//! use gfr_image_transformer::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TransformerConfig::from_env()?;
//!     let variant = Transformer::for_reference("listings/logos/clasificados-pr-logo.png", config)?
//!         .resize(185, 0, ResizeOptions::new().fill_color("white"))?
//!         .with_background("white")?
//!         .jpeg(FormatOptions::new())?
//!         .generate()
//!         .await?;
//!
//!     println!("{} ({:?}x{:?})", variant.url, variant.width, variant.height);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod color;
pub mod config;
pub mod encoder;
pub mod error;
pub mod metadata;
pub mod recipe;
pub mod resolver;
pub mod source;

pub use builder::{FormatOptions, ResizeOptions, Transformer, Variant};
pub use color::{Color, ColorRef};
pub use config::TransformerConfig;
pub use encoder::UrlEncoder;
pub use error::{Result, TransformerError};
pub use metadata::{Metadata, ReferenceForm};
pub use recipe::{Edit, EditRecipe, Fit, OutputFormat};
pub use resolver::{DimensionResolver, Dimensions};
pub use source::{FetchedBytes, HttpImageSource, ImageSource};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::builder::{FormatOptions, ResizeOptions, Transformer, Variant};
    pub use crate::color::{Color, ColorRef};
    pub use crate::config::TransformerConfig;
    pub use crate::error::TransformerError;
    pub use crate::metadata::Metadata;
    pub use crate::recipe::{Fit, OutputFormat};
}
