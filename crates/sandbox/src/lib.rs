//! Capability-restricted evaluation of user functions.
//!
//! A [`UserFunction`] is resolved by name from a [`FunctionRegistry`] and run
//! with a [`FunctionContext`] that exposes only its arguments, a logger and a
//! quota-bounded [`HttpClient`]. The [`CallbackPipeline`] evaluates a batch of
//! requests concurrently, encodes each value as the configured return type
//! and hands the resulting callbacks to a
//! [`FunctionRunner`](oracle_runner::FunctionRunner).

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod builtins;

mod context;
pub use context::FunctionContext;

mod function;
pub use function::{FunctionError, UserFunction};

mod http;
pub use http::{
    HttpClient, HttpError, HttpLimits, HttpRequest, HttpResponse, HttpTransport,
    ReqwestTransport, DEFAULT_HTTP_TIMEOUT, MAX_HTTP_REQUESTS, MAX_HTTP_TIMEOUT, MAX_URL_LENGTH,
};

mod pipeline;
pub use pipeline::{
    callback_transaction, randomness_transaction, CallbackPipeline, DEFAULT_EXPIRATION_SECONDS,
};

mod registry;
pub use registry::{FunctionRegistry, RegistryError};

// Re-export the HTTP method type used by [`HttpRequest`].
pub use reqwest::Method;
