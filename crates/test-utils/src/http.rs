use alloy::primitives::Bytes;
use async_trait::async_trait;
use oracle_sandbox::{HttpError, HttpRequest, HttpResponse, HttpTransport};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

/// An [`HttpTransport`] that answers every request with the same response
/// and records what it was asked.
#[derive(Debug, Clone)]
pub struct MockTransport {
    response: Option<HttpResponse>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    /// Answer every request with `status` and `body`.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            response: Some(HttpResponse { status, headers: BTreeMap::new(), body: body.into() }),
            requests: Default::default(),
        }
    }

    /// Answer every request with a 200 and `value` as the JSON body.
    pub fn json(value: Value) -> Self {
        Self::new(200, value.to_string().into_bytes())
    }

    /// Fail every request at the transport level.
    pub fn failing() -> Self {
        Self { response: None, requests: Default::default() }
    }

    /// Number of requests that reached the transport.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests that reached the transport, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(request);
        self.response.clone().ok_or_else(|| {
            HttpError::Transport(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        })
    }
}
