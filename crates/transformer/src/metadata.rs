//! Source image references.
//!
//! A reference is either an S3 URL, in virtual-hosted
//! (`https://{bucket}.s3.amazonaws.com/{key}`) or path
//! (`https://s3.amazonaws.com/{bucket}/{key}`) form, or a bare object key that
//! lives in a configured default bucket. Keys are taken verbatim from the
//! reference text: no case folding, no dot-segment, separator or
//! percent-escape normalization. The parsed URL only vouches for the scheme
//! and host.

use crate::config::DEFAULT_BUCKET;
use crate::error::{Result, TransformerError};
use reqwest::Url;
use serde::Serialize;

/// Global S3 endpoint host
pub const S3_HOST: &str = "s3.amazonaws.com";

/// Which form a reference was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceForm {
    /// `https://{bucket}.s3.amazonaws.com/{key}`
    SubdomainBucket,
    /// `https://s3.amazonaws.com/{bucket}/{key}`
    PathBucket,
    /// `{key}` in the default bucket
    BareKey,
}

/// Parsed, immutable source reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    original_reference: String,
    bucket: String,
    key: String,
    form: ReferenceForm,
}

impl Metadata {
    /// Parse a reference, placing bare keys in [`DEFAULT_BUCKET`]
    pub fn new(reference: impl Into<String>) -> Result<Self> {
        Self::with_default_bucket(reference, DEFAULT_BUCKET)
    }

    /// Parse a reference, placing bare keys in `default_bucket`
    pub fn with_default_bucket(reference: impl Into<String>, default_bucket: &str) -> Result<Self> {
        let original_reference = reference.into();

        if original_reference.is_empty() {
            return Err(TransformerError::invalid_reference(original_reference, "reference is empty"));
        }

        let (bucket, key, form) = if let Some(absolute) = absolute_form(&original_reference) {
            let url = Url::parse(&absolute)
                .map_err(|e| TransformerError::invalid_reference(&original_reference, e.to_string()))?;
            split_url(&original_reference, &absolute, &url)?
        } else {
            if default_bucket.is_empty() {
                return Err(TransformerError::invalid_reference(
                    original_reference,
                    "bare key given but no default bucket is configured",
                ));
            }
            (default_bucket.to_string(), original_reference.clone(), ReferenceForm::BareKey)
        };

        Ok(Self {
            original_reference,
            bucket,
            key,
            form,
        })
    }

    /// The reference exactly as supplied
    #[must_use]
    pub fn original_reference(&self) -> &str {
        &self.original_reference
    }

    /// Storage bucket
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key within the bucket
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Form the reference was written in
    #[must_use]
    pub fn form(&self) -> ReferenceForm {
        self.form
    }

    /// URL the origin image is read from.
    ///
    /// URL references are fetched as given, so presigned query strings
    /// survive; bare keys are addressed path-style on the global endpoint.
    #[must_use]
    pub fn source_url(&self) -> String {
        match self.form {
            ReferenceForm::BareKey => format!("https://{S3_HOST}/{}/{}", self.bucket, self.key),
            ReferenceForm::SubdomainBucket | ReferenceForm::PathBucket => {
                absolute_form(&self.original_reference).unwrap_or_else(|| self.original_reference.clone())
            }
        }
    }
}

/// Absolute URL text for references carrying a scheme or authority
fn absolute_form(reference: &str) -> Option<String> {
    if reference.starts_with("//") {
        Some(format!("https:{reference}"))
    } else if reference.contains("://") {
        Some(reference.to_string())
    } else {
        None
    }
}

/// Path of `absolute` as written: after the authority, before any query or fragment
fn raw_path<'a>(reference: &str, absolute: &'a str) -> Result<&'a str> {
    let after_scheme = absolute.split_once("://").map_or(absolute, |(_, rest)| rest);
    let authority_end = after_scheme.find(['/', '?', '#']).unwrap_or(after_scheme.len());
    if after_scheme[..authority_end].contains('\\') {
        return Err(TransformerError::invalid_reference(reference, "backslash in URL authority"));
    }

    let rest = &after_scheme[authority_end..];
    let path_end = rest.find(['?', '#']).unwrap_or(rest.len());
    Ok(&rest[..path_end])
}

fn split_url(reference: &str, absolute: &str, url: &Url) -> Result<(String, String, ReferenceForm)> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(TransformerError::invalid_reference(
            reference,
            format!("unsupported scheme {:?}", url.scheme()),
        ));
    }

    let host = url
        .host_str()
        .ok_or_else(|| TransformerError::invalid_reference(reference, "URL has no host"))?;
    let path = raw_path(reference, absolute)?;
    let path = path.strip_prefix('/').unwrap_or(path);

    let (bucket, key, form) = if host == S3_HOST {
        let (bucket, key) = path
            .split_once('/')
            .ok_or_else(|| TransformerError::invalid_reference(reference, "path names a bucket but no key"))?;
        (bucket, key, ReferenceForm::PathBucket)
    } else if let Some(bucket) = host.strip_suffix(S3_HOST).and_then(|b| b.strip_suffix('.')) {
        (bucket, path, ReferenceForm::SubdomainBucket)
    } else {
        return Err(TransformerError::invalid_reference(
            reference,
            format!("unsupported host {host:?}"),
        ));
    };

    if bucket.is_empty() {
        return Err(TransformerError::invalid_reference(reference, "bucket name is empty"));
    }
    if key.is_empty() {
        return Err(TransformerError::invalid_reference(reference, "object key is empty"));
    }

    Ok((bucket.to_string(), key.to_string(), form))
}
