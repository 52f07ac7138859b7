use crate::ConfigError;
use alloy::primitives::Address;
use std::{borrow::Cow, env};

/// Load a variable from the environment
pub fn load_string(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::missing(key))
}

/// Load a variable from the environment
pub fn load_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|val| !val.is_empty())
}

/// Load a variable from the environment
pub fn load_u64(key: &str) -> Result<u64, ConfigError> {
    let val = load_string(key)?;
    val.parse::<u64>().map_err(Into::into)
}

/// Load a variable from the environment
pub fn load_url_opt(key: &str) -> Option<Cow<'static, str>> {
    load_string_opt(key).map(Into::into)
}

/// Load a variable from the environment
pub fn load_address(key: &str) -> Result<Address, ConfigError> {
    load_string(key)?.parse().map_err(Into::into)
}

/// Load a variable from the environment, or return `None` if it is unset.
pub fn load_address_opt(key: &str) -> Result<Option<Address>, ConfigError> {
    load_string_opt(key).map(|val| val.parse().map_err(Into::into)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_var_names_the_key() {
        let err = load_string("ORACLE_TYPES_TEST_DEFINITELY_UNSET").unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing or non-unicode environment variable: ORACLE_TYPES_TEST_DEFINITELY_UNSET"
        );
    }

    #[test]
    fn parses_address_and_u64() {
        env::set_var("ORACLE_TYPES_TEST_ADDRESS", "0x6072257E80d54C5b739893358752d81E16c38E75");
        env::set_var("ORACLE_TYPES_TEST_CHAIN_ID", "1115");

        let address = load_address("ORACLE_TYPES_TEST_ADDRESS").unwrap();
        let expected: Address = "0x6072257E80d54C5b739893358752d81E16c38E75".parse().unwrap();
        assert_eq!(address, expected);
        assert_eq!(load_u64("ORACLE_TYPES_TEST_CHAIN_ID").unwrap(), 1115);
    }

    #[test]
    fn bad_u64_is_a_parse_error() {
        env::set_var("ORACLE_TYPES_TEST_BAD_U64", "eleven");
        assert!(matches!(load_u64("ORACLE_TYPES_TEST_BAD_U64"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn empty_optional_is_none() {
        env::set_var("ORACLE_TYPES_TEST_EMPTY", "");
        assert!(load_string_opt("ORACLE_TYPES_TEST_EMPTY").is_none());
        assert!(load_address_opt("ORACLE_TYPES_TEST_EMPTY").unwrap().is_none());
    }
}
