//! Types shared by oracle functions: result encoding, request configuration
//! and environment helpers.

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
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

/// Configuration loading and environment variable names.
pub mod config;
pub use config::ConfigError;

mod request;
pub use request::{
    requests_from_env, requests_from_json, CodeLanguage, CodeLocation, FunctionRequest,
    RequestConfig,
};

mod result;
pub use result::{
    encode_bytes, encode_int256, encode_result, encode_string, encode_uint256, EncodeError,
    FunctionResult, Integer, ParseIntegerError, RawValue, ReturnType, UnknownReturnType,
};
