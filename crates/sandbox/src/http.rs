//! HTTP capability handed to user functions.
//!
//! Every evaluation gets its own [`HttpClient`], and with it its own request
//! quota. The client never exposes the underlying transport, request
//! configuration or system information to the function.

use alloy::primitives::Bytes;
use async_trait::async_trait;
use core::time::Duration;
use reqwest::Method;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};
use tracing::{debug, instrument, warn};

/// Maximum number of HTTP requests per evaluation.
pub const MAX_HTTP_REQUESTS: u32 = 100;

/// Maximum URL length, in bytes.
pub const MAX_URL_LENGTH: usize = 2048;

/// Maximum per-request timeout.
pub const MAX_HTTP_TIMEOUT: Duration = Duration::from_millis(9000);

/// Timeout used when a request does not set one.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_millis(5000);

/// Errors returned by the HTTP capability.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HttpError {
    /// The evaluation has used up its request quota.
    #[error("exceeded numAllowedQueries ({max})")]
    QuotaExceeded {
        /// The quota.
        max: u32,
    },
    /// The requested timeout is above the limit.
    #[error("HTTP request timeout {requested:?} > {max:?}")]
    TimeoutTooLong {
        /// The requested timeout.
        requested: Duration,
        /// The limit.
        max: Duration,
    },
    /// The URL is longer than the limit.
    #[error("HTTP request URL length {len} > {max}")]
    UrlTooLong {
        /// The URL length.
        len: usize,
        /// The limit.
        max: usize,
    },
    /// The response body is larger than the limit.
    #[error("HTTP response of {len} bytes exceeds maxResponseBytes {max}")]
    ResponseTooLarge {
        /// The response size.
        len: usize,
        /// The limit.
        max: u64,
    },
    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    /// The request could not be completed.
    #[error("HTTP request failed: {0}")]
    Transport(#[source] Box<dyn core::error::Error + Send + Sync>),
    /// The response body is not the expected JSON.
    #[error("failed to parse response body: {0}")]
    Json(#[from] serde_json::Error),
}

impl HttpError {
    /// True if the error is one of the limit violations, as opposed to a
    /// failure of the remote call.
    pub const fn is_limit(&self) -> bool {
        matches!(
            self,
            Self::QuotaExceeded { .. }
                | Self::TimeoutTooLong { .. }
                | Self::UrlTooLong { .. }
                | Self::ResponseTooLarge { .. }
        )
    }
}

/// An HTTP request made by a user function.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// The request URL, without the query string from [`HttpRequest::query`].
    pub url: String,
    /// The request method.
    pub method: Method,
    /// Query parameters appended to the URL.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// JSON request body.
    pub json: Option<Value>,
    /// Request timeout.
    pub timeout: Duration,
    /// Largest body the transport may read. Set by [`HttpClient`] from its
    /// limits.
    pub max_response_bytes: Option<u64>,
}

impl HttpRequest {
    /// Create a request with the given method.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            query: Vec::new(),
            headers: Vec::new(),
            json: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
            max_response_bytes: None,
        }
    }

    /// Create a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a `POST` request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set a JSON body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Set the timeout.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The parts of an HTTP response visible to a user function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// The status code.
    pub status: u16,
    /// Response headers with valid UTF-8 values. Names are lowercase.
    pub headers: BTreeMap<String, String>,
    /// The response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// True for 2xx statuses.
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Parse the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(Into::into)
    }

    /// The body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends HTTP requests on behalf of an [`HttpClient`].
#[async_trait]
pub trait HttpTransport: Send + Sync + core::fmt::Debug {
    /// Send a request. Transports should stop reading a body once it grows
    /// past [`HttpRequest::max_response_bytes`] and fail with
    /// [`HttpError::ResponseTooLarge`].
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// An [`HttpTransport`] backed by a [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a new client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport using the given client.
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = reqwest::Url::parse(&request.url)?;
        let max = request.max_response_bytes;

        let mut builder =
            self.client.request(request.method, url).timeout(request.timeout).query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.json {
            builder = builder.json(body);
        }

        let mut response = builder
            .send()
            .await
            .inspect_err(|e| warn!(%e, "HTTP request failed"))
            .map_err(|e| HttpError::Transport(Box::new(e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        if let (Some(max), Some(len)) = (max, response.content_length()) {
            if len > max {
                return Err(HttpError::ResponseTooLarge { len: len as usize, max });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) =
            response.chunk().await.map_err(|e| HttpError::Transport(Box::new(e)))?
        {
            body.extend_from_slice(&chunk);
            if let Some(max) = max.filter(|max| body.len() as u64 > *max) {
                return Err(HttpError::ResponseTooLarge { len: body.len(), max });
            }
        }

        Ok(HttpResponse { status, headers, body: body.into() })
    }
}

/// Limits applied to a single evaluation's HTTP usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpLimits {
    /// Maximum number of requests.
    pub max_requests: u32,
    /// Maximum URL length.
    pub max_url_length: usize,
    /// Maximum per-request timeout.
    pub max_timeout: Duration,
    /// Maximum response body size, if any.
    pub max_response_bytes: Option<u64>,
}

impl Default for HttpLimits {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpLimits {
    /// The standard limits: 100 requests, 2048-byte URLs, 9 second timeouts.
    pub const fn new() -> Self {
        Self {
            max_requests: MAX_HTTP_REQUESTS,
            max_url_length: MAX_URL_LENGTH,
            max_timeout: MAX_HTTP_TIMEOUT,
            max_response_bytes: None,
        }
    }

    /// Set the maximum response size.
    pub const fn with_max_response_bytes(mut self, max: Option<u64>) -> Self {
        self.max_response_bytes = max;
        self
    }
}

/// A quota-bounded HTTP client scoped to one evaluation.
///
/// Every call counts against the quota, including calls rejected for their
/// timeout or URL length.
#[derive(Debug)]
pub struct HttpClient {
    transport: Arc<dyn HttpTransport>,
    limits: HttpLimits,
    made: AtomicU32,
}

impl HttpClient {
    /// Create a client with a fresh quota.
    pub fn new(transport: Arc<dyn HttpTransport>, limits: HttpLimits) -> Self {
        Self { transport, limits, made: AtomicU32::new(0) }
    }

    /// Get the limits.
    pub const fn limits(&self) -> &HttpLimits {
        &self.limits
    }

    /// Number of requests counted against the quota so far.
    pub fn requests_made(&self) -> u32 {
        self.made.load(Ordering::SeqCst)
    }

    /// Number of requests left in the quota.
    pub fn remaining(&self) -> u32 {
        self.limits.max_requests.saturating_sub(self.requests_made())
    }

    fn reserve(&self) -> Result<u32, HttpError> {
        let max = self.limits.max_requests;
        self.made
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |made| (made < max).then(|| made + 1))
            .map(|prev| prev + 1)
            .map_err(|_| HttpError::QuotaExceeded { max })
    }

    /// Send a request, enforcing the quota and limits.
    #[instrument(skip_all, fields(method = %request.method, url_len = request.url.len()))]
    pub async fn request(&self, mut request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let count = self.reserve()?;
        request.max_response_bytes = self.limits.max_response_bytes;

        if request.timeout > self.limits.max_timeout {
            return Err(HttpError::TimeoutTooLong {
                requested: request.timeout,
                max: self.limits.max_timeout,
            });
        }
        if request.url.len() > self.limits.max_url_length {
            return Err(HttpError::UrlTooLong {
                len: request.url.len(),
                max: self.limits.max_url_length,
            });
        }

        let response = self.transport.send(request).await?;
        if let Some(max) = self.limits.max_response_bytes {
            if response.body.len() as u64 > max {
                return Err(HttpError::ResponseTooLarge { len: response.body.len(), max });
            }
        }

        debug!(count, status = response.status, "HTTP request complete");
        Ok(response)
    }

    /// Send a `GET` request to `url`.
    pub async fn get(&self, url: impl Into<String>) -> Result<HttpResponse, HttpError> {
        self.request(HttpRequest::get(url)).await
    }
}
