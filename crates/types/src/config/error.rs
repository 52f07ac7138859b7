use crate::request::CodeLocation;
use std::path::PathBuf;

/// Error type for [`crate::config`] module. Captures errors related to loading
/// configuration from the environment or from a request configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error loading from environment variable
    #[error("missing or non-unicode environment variable: {0}")]
    Var(String),
    /// Error parsing environment variable
    #[error("failed to parse environment variable: {0}")]
    Parse(#[from] std::num::ParseIntError),
    /// Error parsing hex from environment variable
    #[error("failed to parse hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Error parsing JSON
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Error reading a configuration file.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The request configuration has no source.
    #[error("source is not correctly specified in config")]
    EmptySource,
    /// Secrets were configured but are not supported.
    #[error("secrets and secretsUrls are not supported yet")]
    SecretsUnsupported,
    /// The code location cannot be loaded.
    #[error("code location {0} is not supported")]
    UnsupportedLocation(CodeLocation),
    /// `maxResponseBytes` was set to zero.
    #[error("maxResponseBytes is not correctly specified in config")]
    InvalidMaxResponseBytes,
}

impl ConfigError {
    /// Missing or non-unicode env var.
    pub fn missing(s: &str) -> Self {
        ConfigError::Var(s.to_string())
    }
}
