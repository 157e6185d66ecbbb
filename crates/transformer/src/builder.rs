//! Fluent transformation builder.
//!
//! Chained calls consume the builder and hand back an updated one, so a
//! recipe is never shared between two chains by accident. Every call that can
//! reject its input does so immediately; the only I/O happens inside
//! [`Transformer::generate`], and only when a resize leaves one side at zero.

use crate::color::ColorRef;
use crate::config::TransformerConfig;
use crate::encoder::UrlEncoder;
use crate::error::{Result, TransformerError};
use crate::metadata::Metadata;
use crate::recipe::{Edit, EditRecipe, FlattenOp, Fit, FormatOp, OutputFormat, ResizeOp};
use crate::resolver::DimensionResolver;
use crate::source::{HttpImageSource, ImageSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Options for [`Transformer::resize`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResizeOptions {
    resizer_mode: Option<String>,
    fill_color: Option<ColorRef>,
}

impl ResizeOptions {
    /// Defaults: `cover`, no fill
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit mode by name; checked when passed to `resize`
    #[must_use]
    pub fn resizer_mode(mut self, mode: impl Into<String>) -> Self {
        self.resizer_mode = Some(mode.into());
        self
    }

    /// Fit mode
    #[must_use]
    pub fn fit(mut self, fit: Fit) -> Self {
        self.resizer_mode = Some(fit.as_str().to_string());
        self
    }

    /// Background for areas the resize leaves uncovered
    #[must_use]
    pub fn fill_color(mut self, color: impl Into<ColorRef>) -> Self {
        self.fill_color = Some(color.into());
        self
    }
}

/// Options for the format setters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    quality: Option<u8>,
}

impl FormatOptions {
    /// Format defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder quality, 1-100
    #[must_use]
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }
}

/// Result of [`Transformer::generate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Encoded variant URL
    pub url: String,
    /// Final width; `None` without a resize
    pub width: Option<u32>,
    /// Final height; `None` without a resize
    pub height: Option<u32>,
}

/// Builds a variant URL for one source image
pub struct Transformer<S = HttpImageSource> {
    metadata: Arc<Metadata>,
    config: Arc<TransformerConfig>,
    resolver: Arc<DimensionResolver<S>>,
    recipe: EditRecipe,
}

// Clones share the dimension cache: same image, same answer.
impl<S> Clone for Transformer<S> {
    fn clone(&self) -> Self {
        Self {
            metadata: Arc::clone(&self.metadata),
            config: Arc::clone(&self.config),
            resolver: Arc::clone(&self.resolver),
            recipe: self.recipe.clone(),
        }
    }
}

impl<S> fmt::Debug for Transformer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("metadata", &self.metadata)
            .field("recipe", &self.recipe)
            .field("dimensions", &self.resolver.cached())
            .finish_non_exhaustive()
    }
}

impl Transformer<HttpImageSource> {
    /// Builder reading origin dimensions over HTTP
    pub fn new(metadata: Metadata, config: TransformerConfig) -> Result<Self> {
        config.validate()?;
        let source = HttpImageSource::new(&config)?;
        Self::with_source(metadata, config, source)
    }

    /// Parse `reference` with `config`'s default bucket and wrap it
    pub fn for_reference(reference: impl Into<String>, config: TransformerConfig) -> Result<Self> {
        let metadata = config.metadata(reference)?;
        Self::new(metadata, config)
    }
}

impl<S: ImageSource> Transformer<S> {
    /// Builder reading origin dimensions from `source`
    pub fn with_source(metadata: Metadata, config: TransformerConfig, source: S) -> Result<Self> {
        config.validate()?;
        let resolver = DimensionResolver::new(&metadata, source, config.header_bytes);
        Ok(Self {
            metadata: Arc::new(metadata),
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            recipe: EditRecipe::new(),
        })
    }

    /// Object key of the source image
    #[must_use]
    pub fn key(&self) -> &str {
        self.metadata.key()
    }

    /// Bucket of the source image
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.metadata.bucket()
    }

    /// Parsed source reference
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Edits accumulated so far
    #[must_use]
    pub fn recipe(&self) -> &EditRecipe {
        &self.recipe
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Resize to `width` x `height`. A zero side is inferred from the origin's
    /// aspect ratio at [`generate`](Self::generate) time.
    ///
    /// # Errors
    /// [`TransformerError::Argument`] for an unknown resizer mode or colour.
    pub fn resize(mut self, width: u32, height: u32, options: ResizeOptions) -> Result<Self> {
        let fit = match options.resizer_mode.as_deref() {
            Some(mode) => mode.parse::<Fit>()?,
            None => Fit::default(),
        };
        let background = options.fill_color.as_ref().map(ColorRef::resolve).transpose()?;

        self.recipe.set(Edit::Resize(ResizeOp {
            width,
            height,
            fit,
            background,
        }));
        Ok(self)
    }

    /// Set the background on the current resize and flatten onto it.
    ///
    /// # Errors
    /// [`TransformerError::State`] if no resize has been set;
    /// [`TransformerError::Argument`] for an unknown colour.
    pub fn with_background(mut self, color: impl Into<ColorRef>) -> Result<Self> {
        let background = color.into().resolve()?;
        self.recipe.merge_resize_background(background)?;
        self.recipe.set(Edit::Flatten(FlattenOp { background }));
        Ok(self)
    }

    /// Convert to JPEG (quality 90 unless given)
    pub fn jpeg(self, options: FormatOptions) -> Result<Self> {
        self.format(OutputFormat::Jpeg, options)
    }

    /// Convert to PNG
    pub fn png(self, options: FormatOptions) -> Result<Self> {
        self.format(OutputFormat::Png, options)
    }

    /// Convert to WebP
    pub fn webp(self, options: FormatOptions) -> Result<Self> {
        self.format(OutputFormat::Webp, options)
    }

    /// Convert to `format`, replacing any earlier format choice
    pub fn format(mut self, format: OutputFormat, options: FormatOptions) -> Result<Self> {
        if let Some(quality) = options.quality {
            if !(1..=100).contains(&quality) {
                return Err(TransformerError::argument(format!(
                    "quality must be between 1 and 100, got {quality}"
                )));
            }
        }

        let quality = options.quality.or_else(|| format.default_quality());
        self.recipe.set(Edit::Format(format, FormatOp { quality }));
        self.recipe.set(Edit::ToFormat(format));
        Ok(self)
    }

    /// Resolve any missing resize dimension and encode the variant URL.
    ///
    /// Fetches from the origin at most once per builder (and its clones);
    /// a failed fetch leaves the builder intact for another attempt.
    #[instrument(skip(self), fields(bucket = %self.metadata.bucket(), key = %self.metadata.key()))]
    pub async fn generate(&self) -> Result<Variant> {
        let mut recipe = self.recipe.clone();

        let (width, height) = match recipe.resize_mut() {
            Some(op) => {
                if op.needs_inference() {
                    let original = self.resolver.dimensions().await?;
                    let (width, height) = original.infer_missing(op.width, op.height);
                    debug!(
                        requested_width = op.width,
                        requested_height = op.height,
                        width,
                        height,
                        "Inferred resize dimensions"
                    );
                    op.width = width;
                    op.height = height;
                } else if op.width == 0 {
                    warn!("Resize with both sides zero is passed through unresolved");
                }
                (Some(op.width), Some(op.height))
            }
            None => (None, None),
        };

        let payload = recipe.to_payload(self.metadata.bucket(), self.metadata.key());
        let url = UrlEncoder::encode(&self.config.base_domain, &payload)?;

        debug!(edits = recipe.len(), "Generated variant");

        Ok(Variant { url, width, height })
    }
}
