use allot_core::{AllotError, BasicCredentials, ForwardPayload};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Headers sent with every upstream call, in addition to `Authorization`.
pub const FORWARD_HEADERS: [(&str, &str); 4] = [
    ("Accept", "application/json, text/javascript, */*; q=0.01"),
    ("Content-Type", "application/json"),
    ("X-Requested-With", "XMLHttpRequest"),
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
    ),
];

/// A response that made it back from the store, whatever its status.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Why an upstream call produced no response. Variants are listed in
/// classification priority order.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("upstream timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for ForwardError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ForwardError::Timeout
        } else if e.is_connect() {
            ForwardError::Connect(e.to_string())
        } else {
            ForwardError::Other(e.to_string())
        }
    }
}

/// Seam between the forwarder and the network.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn post_allocations(
        &self,
        credentials: &BasicCredentials,
        payload: &ForwardPayload,
    ) -> Result<UpstreamResponse, ForwardError>;
}

/// reqwest-backed client for the store's allocation endpoint.
///
/// One attempt per call, bounded by the configured timeout. No retries.
pub struct HttpUpstream {
    client: reqwest::Client,
    url: String,
}

impl HttpUpstream {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AllotError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AllotError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn post_allocations(
        &self,
        credentials: &BasicCredentials,
        payload: &ForwardPayload,
    ) -> Result<UpstreamResponse, ForwardError> {
        let mut request = self
            .client
            .post(&self.url)
            .basic_auth(&credentials.username, Some(&credentials.password));
        for (name, value) in FORWARD_HEADERS {
            request = request.header(name, value);
        }
        let body = serde_json::to_vec(payload).map_err(|e| ForwardError::Other(e.to_string()))?;

        let response = request.body(body).send().await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.text().await?;

        debug!(status, bytes = body.len(), "Upstream responded");
        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// Flatten a header map; repeated headers are joined with `", "`.
fn collect_headers(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}
