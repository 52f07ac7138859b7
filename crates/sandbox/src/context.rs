use crate::{FunctionError, HttpClient, HttpError, HttpRequest, HttpResponse};
use alloy::primitives::Address;
use tracing::{info, warn};

/// The capabilities handed to a single evaluation of a user function.
///
/// A context is built for one request and dropped once the function
/// returns. It owns the HTTP quota for that evaluation, so concurrent
/// evaluations never share a counter.
#[derive(Debug)]
pub struct FunctionContext {
    args: Vec<String>,
    call_id: Option<Address>,
    http: HttpClient,
}

impl FunctionContext {
    /// Create a context for one evaluation.
    pub const fn new(args: Vec<String>, call_id: Option<Address>, http: HttpClient) -> Self {
        Self { args, call_id, http }
    }

    /// The positional arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The argument at `index`.
    pub fn arg(&self, index: usize) -> Result<&str, FunctionError> {
        self.args.get(index).map(String::as_str).ok_or(FunctionError::MissingArg(index))
    }

    /// The call id of the request being served, if any.
    pub const fn call_id(&self) -> Option<Address> {
        self.call_id
    }

    /// The bounded HTTP client for this evaluation.
    pub const fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Send an HTTP request against this evaluation's quota.
    pub async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.http.request(request).await
    }

    /// Log a message from the function.
    pub fn log(&self, message: &str) {
        info!(call_id = ?self.call_id, "{message}");
    }

    /// Log a warning from the function.
    pub fn warn(&self, message: &str) {
        warn!(call_id = ?self.call_id, "{message}");
    }
}
