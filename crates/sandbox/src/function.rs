use crate::{FunctionContext, HttpError};
use async_trait::async_trait;
use oracle_types::{EncodeError, RawValue};

/// Errors raised by a user function.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FunctionError {
    /// The function gave up with a message.
    #[error("{0}")]
    Thrown(String),
    /// An HTTP call failed or hit a limit.
    #[error(transparent)]
    Http(#[from] HttpError),
    /// The function's value could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// A required positional argument is missing.
    #[error("missing argument {0}")]
    MissingArg(usize),
    /// A positional argument could not be interpreted.
    #[error("invalid argument {index}: {reason}")]
    InvalidArg {
        /// The argument position.
        index: usize,
        /// Why it was rejected.
        reason: String,
    },
}

impl FunctionError {
    /// Give up with a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Thrown(message.into())
    }
}

/// User-owned logic run once per request.
///
/// Implementations only see what the [`FunctionContext`] hands them. The
/// value they return is checked against the request's expected return type
/// before it becomes a callback.
#[async_trait]
pub trait UserFunction: Send + Sync + core::fmt::Debug {
    /// Evaluate the function.
    async fn run(&self, ctx: &FunctionContext) -> Result<RawValue, FunctionError>;
}
