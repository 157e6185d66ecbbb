//! Shared fixtures for integration tests.

#![allow(dead_code)]

use gfr_image_transformer::{FetchedBytes, ImageSource, Result, TransformerConfig, TransformerError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const DOMAIN: &str = "https://images.listamax.com";

pub const LISTING_URL: &str = "https://s3.amazonaws.com/media.listamax.com/listings/2020/02/25/apartment-for-sale-in-chalets-de-la-playa-in-vega-baja-puerto-rico-dc355701a612a0443b574c340996f35a.jpg";

pub fn config() -> TransformerConfig {
    TransformerConfig::default().with_base_domain(DOMAIN)
}

/// Minimal PNG: signature plus IHDR
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 2, 0, 0, 0]);
    data
}

/// Baseline JPEG header preceded by `exif_len` bytes of APP1 data
pub fn jpeg(width: u16, height: u16, exif_len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE1];
    data.extend_from_slice(&((exif_len + 2) as u16).to_be_bytes());
    data.resize(data.len() + exif_len, 0);
    data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&[0x03, 0x01, 0x22, 0x00, 0xFF, 0xD9]);
    data
}

/// In-memory origin that counts fetches
#[derive(Clone)]
pub struct StubSource {
    body: Arc<Vec<u8>>,
    calls: Arc<AtomicUsize>,
    failures_left: Arc<AtomicUsize>,
    delay: Duration,
}

impl StubSource {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body: Arc::new(body),
            calls: Arc::new(AtomicUsize::new(0)),
            failures_left: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Fail the next `n` fetches with a connection error
    pub fn failing(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageSource for StubSource {
    async fn fetch(&self, url: &str, limit: Option<usize>) -> Result<FetchedBytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(TransformerError::Fetch {
                url: url.to_string(),
                reason: "connection refused".into(),
            });
        }

        Ok(match limit {
            Some(limit) if limit < self.body.len() => FetchedBytes::prefix(self.body[..limit].to_vec()),
            _ => FetchedBytes::complete(self.body.to_vec()),
        })
    }
}
