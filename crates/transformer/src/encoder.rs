//! Variant URL encoding.
//!
//! `{base_domain}/{base64url(json)}`: compact JSON, URL-safe alphabet, padding
//! kept. The remote service caches on the exact URL, so the same recipe must
//! always encode to the same bytes.

use crate::error::{Result, TransformerError};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use serde::Serialize;

/// Stateless encoder for variant URLs
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlEncoder;

impl UrlEncoder {
    /// Serialize `payload` and append it to `base_domain`
    pub fn encode<T: Serialize + ?Sized>(base_domain: &str, payload: &T) -> Result<String> {
        let json = serde_json::to_vec(payload)?;
        Ok(format!(
            "{}/{}",
            base_domain.trim_end_matches('/'),
            URL_SAFE.encode(json)
        ))
    }

    /// JSON text carried by a variant URL (or a bare encoded segment)
    pub fn decode_json(url: &str) -> Result<String> {
        let segment = url.rsplit('/').next().unwrap_or(url);
        let bytes = URL_SAFE
            .decode(segment)
            .map_err(|e| TransformerError::InvalidPayload(format!("not base64url: {e}")))?;
        String::from_utf8(bytes).map_err(|e| TransformerError::InvalidPayload(format!("not UTF-8: {e}")))
    }

    /// Parsed JSON carried by a variant URL
    pub fn decode(url: &str) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&Self::decode_json(url)?)?)
    }
}
