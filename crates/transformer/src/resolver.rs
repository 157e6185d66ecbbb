//! Lazy, single-flight lookup of origin image dimensions.

use crate::error::{Result, TransformerError};
use crate::metadata::Metadata;
use crate::source::{HttpImageSource, ImageSource};
use gfr_image::{ImageError, ImageMetadata, read_dimensions};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, instrument, warn};

/// Pixel size of an origin image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels, never zero
    pub width: u32,
    /// Height in pixels, never zero
    pub height: u32,
}

impl Dimensions {
    /// Fill in whichever requested side is zero so the result keeps this
    /// image's aspect ratio. Requests with both or neither side zero pass
    /// through unchanged.
    ///
    /// ```
    /// use gfr_image_transformer::Dimensions;
    ///
    /// let original = Dimensions { width: 1920, height: 1080 };
    /// assert_eq!(original.infer_missing(640, 0), (640, 360));
    /// assert_eq!(original.infer_missing(0, 480), (853, 480));
    /// ```
    #[must_use]
    pub fn infer_missing(&self, width: u32, height: u32) -> (u32, u32) {
        match (width, height) {
            (0, 0) => (0, 0),
            (width, 0) => (width, scale(width, self.height, self.width)),
            (0, height) => (scale(height, self.width, self.height), height),
            requested => requested,
        }
    }
}

impl From<ImageMetadata> for Dimensions {
    fn from(meta: ImageMetadata) -> Self {
        Self {
            width: meta.width,
            height: meta.height,
        }
    }
}

/// `round(side * numerator / denominator)`, at least one pixel
fn scale(side: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = (f64::from(side) * f64::from(numerator) / f64::from(denominator)).round();
    (scaled as u32).max(1)
}

/// Fetches and caches the dimensions of one origin image.
///
/// Concurrent callers share a single in-flight fetch and all receive its
/// outcome, success or failure. A success is cached for the resolver's
/// lifetime. A failure is not: calls made after it completes fetch again.
pub struct DimensionResolver<S = HttpImageSource> {
    source_url: String,
    header_bytes: usize,
    source: S,
    cache: OnceCell<Dimensions>,
    /// Completed fetch attempts
    attempts: AtomicU64,
    /// Held for the duration of a fetch; carries the last attempt's failure
    flight: Mutex<Option<TransformerError>>,
}

impl<S> DimensionResolver<S> {
    /// URL the dimensions are read from
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Dimensions already resolved, without fetching
    #[must_use]
    pub fn cached(&self) -> Option<Dimensions> {
        self.cache.get().copied()
    }
}

impl<S: ImageSource> DimensionResolver<S> {
    /// Resolver for the image `metadata` points at
    pub fn new(metadata: &Metadata, source: S, header_bytes: usize) -> Self {
        Self::for_url(metadata.source_url(), source, header_bytes)
    }

    /// Resolver for the image at `source_url`
    pub fn for_url(source_url: impl Into<String>, source: S, header_bytes: usize) -> Self {
        Self {
            source_url: source_url.into(),
            header_bytes,
            source,
            cache: OnceCell::new(),
            attempts: AtomicU64::new(0),
            flight: Mutex::new(None),
        }
    }

    /// Dimensions of the origin image, fetching them on first use
    #[instrument(skip(self), fields(url = %self.source_url))]
    pub async fn dimensions(&self) -> Result<Dimensions> {
        if let Some(dimensions) = self.cached() {
            debug!(width = dimensions.width, height = dimensions.height, "Dimensions cache hit");
            return Ok(dimensions);
        }

        let joined = self.attempts.load(Ordering::Acquire);
        let mut last_failure = self.flight.lock().await;

        if let Some(dimensions) = self.cached() {
            return Ok(dimensions);
        }
        // An attempt finished while this call waited on it
        if self.attempts.load(Ordering::Acquire) != joined {
            if let Some(err) = last_failure.as_ref() {
                debug!(error = %err, "Sharing failure of in-flight fetch");
                return Err(err.clone());
            }
        }

        let outcome = self.fetch_dimensions().await;
        self.attempts.fetch_add(1, Ordering::AcqRel);

        match outcome {
            Ok(dimensions) => {
                *last_failure = None;
                // Only the flight holder sets the cache
                let _ = self.cache.set(dimensions);
                Ok(dimensions)
            }
            Err(err) => {
                *last_failure = Some(err.clone());
                Err(err)
            }
        }
    }

    async fn fetch_dimensions(&self) -> Result<Dimensions> {
        let header = self.source.fetch(&self.source_url, Some(self.header_bytes)).await?;

        let meta = match read_dimensions(&header.data) {
            Ok(meta) => meta,
            Err(ImageError::InvalidData(reason)) if header.partial => {
                warn!(
                    bytes = header.data.len(),
                    reason = %reason,
                    "Header not readable from ranged read, fetching full image"
                );
                let full = self.source.fetch(&self.source_url, None).await?;
                read_dimensions(&full.data).map_err(|e| self.unsupported(&e))?
            }
            Err(e) => return Err(self.unsupported(&e)),
        };

        debug!(
            format = meta.format.name(),
            width = meta.width,
            height = meta.height,
            "Resolved origin dimensions"
        );

        Ok(meta.into())
    }

    fn unsupported(&self, err: &ImageError) -> TransformerError {
        TransformerError::UnsupportedFormat {
            url: self.source_url.clone(),
            reason: err.to_string(),
        }
    }
}
