use alloy::{
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use oracle_types::config::{
    env_utils::{load_string, load_string_opt, load_u64, load_url_opt},
    CHAIN_ID, DEFAULT_RPC_URL, PRIVATE_KEY, RPC_URL,
};

/// The RPC endpoint from [`RPC_URL`], or the default endpoint.
pub(crate) fn rpc_url() -> eyre::Result<Url> {
    let url = load_url_opt(RPC_URL).unwrap_or(DEFAULT_RPC_URL.into());
    Ok(url.parse()?)
}

/// The signer from [`PRIVATE_KEY`].
pub(crate) fn signer() -> eyre::Result<PrivateKeySigner> {
    let key = load_string(PRIVATE_KEY)?;
    Ok(key.trim().parse()?)
}

/// The chain id from [`CHAIN_ID`], if set.
pub(crate) fn chain_id_opt() -> eyre::Result<Option<u64>> {
    load_string_opt(CHAIN_ID).map(|_| load_u64(CHAIN_ID)).transpose().map_err(Into::into)
}

/// A read-only provider.
pub(crate) fn read_provider() -> eyre::Result<impl Provider + Clone> {
    Ok(ProviderBuilder::new().connect_http(rpc_url()?))
}

/// A provider that signs with [`signer`].
pub(crate) fn wallet_provider() -> eyre::Result<impl Provider + Clone> {
    Ok(ProviderBuilder::new().wallet(signer()?).connect_http(rpc_url()?))
}
