use crate::{
    config::{env_utils, FUNCTION_REQUESTS},
    ConfigError, ReturnType,
};
use alloy::primitives::Address;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

/// Where a function's code is loaded from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeLocation {
    /// The code is compiled into the running binary and resolved by name.
    #[default]
    Inline,
    /// The code is fetched from a remote location. Not supported.
    Remote,
}

impl fmt::Display for CodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => f.write_str("inline"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// The language a function's code is written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeLanguage {
    /// Native code registered with the function registry.
    #[default]
    Native,
}

/// Configuration for a function request.
///
/// Loaded once at startup and passed explicitly into the callback pipeline.
/// Use [`RequestConfig::load`] to read and validate a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    /// Where the function's code lives.
    #[serde(default)]
    pub code_location: CodeLocation,
    /// The language of the function's code.
    #[serde(default)]
    pub code_language: CodeLanguage,
    /// The function's source. For inline native code this is the name the
    /// function is registered under.
    pub source: String,
    /// Positional arguments used when the runner supplies no requests.
    #[serde(default)]
    pub args: Vec<String>,
    /// The type the function must return.
    pub expected_return_type: ReturnType,
    /// Secrets made available to the function. Must be empty.
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
    /// URLs to fetch secrets from. Must be empty.
    #[serde(default)]
    pub secrets_urls: Vec<String>,
    /// Maximum size of an HTTP response body the function may read.
    #[serde(default)]
    pub max_response_bytes: Option<u64>,
}

impl RequestConfig {
    /// Create an inline native request configuration.
    pub fn inline(source: impl Into<String>, expected_return_type: ReturnType) -> Self {
        Self {
            code_location: CodeLocation::Inline,
            code_language: CodeLanguage::Native,
            source: source.into(),
            args: Vec::new(),
            expected_return_type,
            secrets: BTreeMap::new(),
            secrets_urls: Vec::new(),
            max_response_bytes: None,
        }
    }

    /// Set the positional arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the maximum response size.
    pub const fn with_max_response_bytes(mut self, max: u64) -> Self {
        self.max_response_bytes = Some(max);
        self
    }

    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(json)?.validate()
    }

    /// Read a configuration file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    /// Check that the configuration can be executed.
    ///
    /// Secrets are not supported and fail fast rather than being ignored.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.source.trim().is_empty() {
            return Err(ConfigError::EmptySource);
        }
        if !self.secrets.is_empty() || !self.secrets_urls.is_empty() {
            return Err(ConfigError::SecretsUnsupported);
        }
        if self.code_location != CodeLocation::Inline {
            return Err(ConfigError::UnsupportedLocation(self.code_location));
        }
        if self.max_response_bytes == Some(0) {
            return Err(ConfigError::InvalidMaxResponseBytes);
        }
        Ok(self)
    }
}

/// A single pending call to a function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRequest {
    /// The on-chain call this request answers, if any.
    #[serde(default)]
    pub call_id: Option<Address>,
    /// Positional arguments for the function.
    #[serde(default)]
    pub params: Vec<String>,
}

impl FunctionRequest {
    /// Create a request with the given parameters and no call id.
    pub fn new<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { call_id: None, params: params.into_iter().map(Into::into).collect() }
    }

    /// Set the call id.
    pub const fn with_call_id(mut self, call_id: Address) -> Self {
        self.call_id = Some(call_id);
        self
    }
}

/// Parse pending requests from JSON, falling back to a single request built
/// from the configuration's `args` when there are none.
pub fn requests_from_json(
    json: Option<&str>,
    config: &RequestConfig,
) -> Result<Vec<FunctionRequest>, ConfigError> {
    let requests = match json {
        Some(json) => serde_json::from_str::<Vec<FunctionRequest>>(json)?,
        None => Vec::new(),
    };
    if requests.is_empty() {
        return Ok(vec![FunctionRequest::new(config.args.iter().cloned())]);
    }
    Ok(requests)
}

/// Load pending requests from the [`FUNCTION_REQUESTS`] environment variable.
pub fn requests_from_env(config: &RequestConfig) -> Result<Vec<FunctionRequest>, ConfigError> {
    requests_from_json(env_utils::load_string_opt(FUNCTION_REQUESTS).as_deref(), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_config() {
        let config = RequestConfig::from_json(
            r#"{
                "codeLocation": "inline",
                "codeLanguage": "native",
                "source": "random-uint256",
                "args": ["1", "0xabc"],
                "expectedReturnType": "uint256",
                "secrets": {},
                "secretsUrls": []
            }"#,
        )
        .unwrap();
        assert_eq!(config.source, "random-uint256");
        assert_eq!(config.args, vec!["1", "0xabc"]);
        assert_eq!(config.expected_return_type, ReturnType::Uint256);
        assert_eq!(config.max_response_bytes, None);
    }

    #[test]
    fn non_string_args_are_rejected() {
        let err = RequestConfig::from_json(
            r#"{"source": "f", "args": [1], "expectedReturnType": "int256"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn secrets_fail_fast() {
        let err = RequestConfig::from_json(
            r#"{"source": "f", "expectedReturnType": "string", "secrets": {"key": "value"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::SecretsUnsupported));

        let err = RequestConfig::from_json(
            r#"{"source": "f", "expectedReturnType": "string", "secretsUrls": ["https://x"]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::SecretsUnsupported));
    }

    #[test]
    fn remote_location_and_empty_source_are_rejected() {
        let err = RequestConfig::from_json(
            r#"{"codeLocation": "remote", "source": "f", "expectedReturnType": "uint"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedLocation(CodeLocation::Remote)));

        let err = RequestConfig::inline("  ", ReturnType::Uint256).validate().unwrap_err();
        assert!(matches!(err, ConfigError::EmptySource));
    }

    #[test]
    fn zero_max_response_bytes_is_rejected() {
        let err = RequestConfig::inline("f", ReturnType::Bytes)
            .with_max_response_bytes(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMaxResponseBytes));
    }

    #[test]
    fn requests_fall_back_to_config_args() {
        let config = RequestConfig::inline("f", ReturnType::Uint256).with_args(["7"]);

        let requests = requests_from_json(None, &config).unwrap();
        assert_eq!(requests, vec![FunctionRequest::new(["7"])]);

        let requests = requests_from_json(Some("[]"), &config).unwrap();
        assert_eq!(requests, vec![FunctionRequest::new(["7"])]);
    }

    #[test]
    fn requests_parse_call_ids() {
        let config = RequestConfig::inline("f", ReturnType::Uint256);
        let requests = requests_from_json(
            Some(
                r#"[
                    {"callId": "0x0000000000000000000000000000000000000001", "params": ["1"]},
                    {"params": ["2", "0x0"]}
                ]"#,
            ),
            &config,
        )
        .unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].call_id, Some(Address::with_last_byte(1)));
        assert_eq!(requests[1].params, vec!["2", "0x0"]);
    }
}
