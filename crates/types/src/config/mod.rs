mod error;
pub use error::ConfigError;

/// Helpers for loading values from the process environment.
pub mod env_utils;

/// Environment variable holding the JSON-RPC endpoint.
pub const RPC_URL: &str = "RPC_URL";
/// Environment variable holding the chain id.
pub const CHAIN_ID: &str = "CHAIN_ID";
/// Environment variable holding the function verifying contract.
pub const VERIFYING_CONTRACT: &str = "VERIFYING_CONTRACT";
/// Environment variable holding the target contract for transfers.
pub const TARGET_CONTRACT: &str = "TARGET_CONTRACT";
/// Environment variable holding the callback receiver contract.
pub const RECEIVER_ADDRESS: &str = "SWITCHBOARD_RECEIVER_ADDRESS";
/// Environment variable holding the price feed receiver contract.
pub const PUSH_RECEIVER_ADDRESS: &str = "SWITCHBOARD_PUSH_ADDRESS";
/// Environment variable holding the oracle contract that receivers trust.
pub const SWITCHBOARD_ADDRESS: &str = "SWITCHBOARD_ADDRESS";
/// Environment variable holding the function id.
pub const FUNCTION_ID: &str = "FUNCTION_ID";
/// Environment variable holding the signing key.
pub const PRIVATE_KEY: &str = "PRIVATE_KEY";
/// Environment variable holding pending function requests, as JSON.
pub const FUNCTION_REQUESTS: &str = "FUNCTION_REQUESTS";
/// Environment variable holding the path of the request configuration file.
pub const FUNCTION_CONFIG: &str = "FUNCTION_CONFIG";

/// Default JSON-RPC endpoint, used when [`RPC_URL`] is unset.
pub const DEFAULT_RPC_URL: &str = "https://rpc.test.btcs.network";
