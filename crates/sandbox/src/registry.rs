use crate::{builtins, UserFunction};
use oracle_types::{ConfigError, RequestConfig};
use std::{collections::BTreeMap, sync::Arc};

/// Errors returned when resolving a function for a request configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// The configuration is not executable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// No function is registered under the configured source.
    #[error("no function registered as {0:?}")]
    UnknownFunction(String),
}

/// Native user functions, addressed by the name used as `source` in a
/// [`RequestConfig`].
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Arc<dyn UserFunction>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in functions.
    pub fn with_builtins() -> Self {
        Self::new()
            .with(builtins::RANDOM_UINT256, builtins::RandomUint256)
            .with(builtins::PARAMS_RANDOMNESS, builtins::ParamsRandomness::default())
            .with(builtins::JSON_POINTER, builtins::JsonPointer)
    }

    /// Register `function` as `name`, returning the registry.
    pub fn with(mut self, name: impl Into<String>, function: impl UserFunction + 'static) -> Self {
        self.register(name, function);
        self
    }

    /// Register `function` as `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, function: impl UserFunction + 'static) {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Names of the registered functions.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Get the function registered as `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn UserFunction>> {
        self.functions.get(name).cloned()
    }

    /// Validate `config` and get the function it names.
    pub fn resolve(&self, config: &RequestConfig) -> Result<Arc<dyn UserFunction>, RegistryError> {
        let config = config.clone().validate()?;
        let name = config.source.trim();
        self.get(name).ok_or_else(|| RegistryError::UnknownFunction(name.to_string()))
    }
}
