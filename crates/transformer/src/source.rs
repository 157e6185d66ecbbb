//! Reading origin image bytes.

use crate::config::TransformerConfig;
use crate::error::{Result, TransformerError};
use reqwest::header::{HeaderMap, HeaderValue, RANGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Bytes returned by an [`ImageSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBytes {
    /// Leading bytes of the object, or all of it
    pub data: Vec<u8>,
    /// Only a prefix was returned; more of the object exists
    pub partial: bool,
}

impl FetchedBytes {
    /// Bytes that make up the whole object
    #[must_use]
    pub fn complete(data: Vec<u8>) -> Self {
        Self { data, partial: false }
    }

    /// Leading bytes of a larger object
    #[must_use]
    pub fn prefix(data: Vec<u8>) -> Self {
        Self { data, partial: true }
    }
}

/// Where origin image bytes come from.
///
/// `limit` asks for at most that many leading bytes; sources that cannot read
/// ranges may return the whole object with `partial: false`.
pub trait ImageSource: Send + Sync {
    /// Read the object at `url`
    fn fetch(&self, url: &str, limit: Option<usize>) -> impl Future<Output = Result<FetchedBytes>> + Send;
}

/// [`ImageSource`] over HTTP(S) with ranged GETs
#[derive(Clone)]
pub struct HttpImageSource {
    inner: Client,
    timeout: Duration,
}

impl HttpImageSource {
    /// Create a source with the timeout and user agent from `config`
    pub fn new(config: &TransformerConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| TransformerError::config(format!("invalid user agent: {e}")))?;
        default_headers.insert(USER_AGENT, user_agent);

        let inner = Client::builder()
            .timeout(config.fetch_timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| TransformerError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            timeout: config.fetch_timeout,
        })
    }
}

impl ImageSource for HttpImageSource {
    #[instrument(skip(self), fields(request_id))]
    async fn fetch(&self, url: &str, limit: Option<usize>) -> Result<FetchedBytes> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let mut request = self.inner.get(url).header(X_REQUEST_ID, &request_id);
        if let Some(limit) = limit {
            request = request.header(RANGE, format!("bytes=0-{}", limit.saturating_sub(1)));
        }

        let start = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| TransformerError::from_request(url, &e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransformerError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransformerError::from_request(url, &e, self.timeout))?;

        // 200 to a ranged request: the server ignored Range and sent everything
        let partial = status == StatusCode::PARTIAL_CONTENT;

        debug!(
            request_id = %request_id,
            status = status.as_u16(),
            bytes = body.len(),
            partial,
            elapsed_ms = start.elapsed().as_millis(),
            "Fetched origin bytes"
        );

        Ok(FetchedBytes {
            data: body.to_vec(),
            partial,
        })
    }
}
