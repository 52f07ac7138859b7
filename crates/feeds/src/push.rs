use crate::{aggregate, FeedValues, SourceError, TickerSource, UpdatePlan};
use alloy::{network::Ethereum, primitives::Address, providers::Provider};
use futures_util::future::join_all;
use oracle_bindings::PushReceiver::{self, PushReceiverInstance};
use oracle_runner::{expiration_from_now, FunctionRunner};
use tracing::{info, instrument, warn};

/// Gas-limit hint for a feed batch.
pub const PUSH_GAS_LIMIT: u64 = 5_500_000;

/// Seconds a feed batch stays valid.
pub const PUSH_EXPIRATION_SECONDS: u64 = 64;

/// Errors returned by [`FeedPusher`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PushError<E> {
    /// Reading the receiver's feeds failed.
    #[error("failed to read receiver feeds: {0}")]
    Contract(#[from] alloy::contract::Error),
    /// Every source failed.
    #[error("no ticker source returned data")]
    NoSamples,
    /// The runner rejected the batch.
    #[error("failed to emit feed batch: {0}")]
    Runner(#[source] E),
}

/// Errors returned by [`FeedPusher::configure`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigureError {
    /// Sending a transaction failed.
    #[error("contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),
    /// Waiting for a receipt failed.
    #[error("failed to confirm transaction: {0}")]
    Pending(#[from] alloy::providers::PendingTransactionError),
}

/// Fetch every source concurrently and aggregate the samples.
///
/// A failing source is logged and skipped. Returns the error of the last
/// failing source if none succeeded.
#[instrument(skip_all, fields(sources = sources.len()))]
pub async fn fetch_feeds(sources: &[Box<dyn TickerSource>]) -> Result<FeedValues, SourceError> {
    let results = join_all(sources.iter().map(|source| source.fetch())).await;

    let mut samples = Vec::new();
    let mut last_err = None;
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(fetched) => samples.extend(fetched),
            Err(e) => {
                warn!(source = source.name(), %e, "ticker source failed");
                last_err = Some(e);
            }
        }
    }

    match last_err {
        Some(e) if samples.is_empty() => Err(e),
        _ => Ok(aggregate(samples)),
    }
}

/// Reads a push receiver's feeds and pushes fresh values to it.
#[derive(Debug)]
pub struct FeedPusher<P> {
    receiver: PushReceiverInstance<P>,
    sources: Vec<Box<dyn TickerSource>>,
}

impl<P> FeedPusher<P>
where
    P: Provider<Ethereum>,
{
    /// Create a pusher for the receiver at `address`.
    pub fn new(address: Address, provider: P, sources: Vec<Box<dyn TickerSource>>) -> Self {
        Self { receiver: PushReceiver::new(address, provider), sources }
    }

    /// Get the receiver address.
    pub fn address(&self) -> &Address {
        self.receiver.address()
    }

    /// Point the receiver at a new oracle contract and function id, waiting
    /// for both transactions to land.
    #[instrument(skip(self))]
    pub async fn configure(
        &self,
        switchboard: Address,
        function_id: Address,
    ) -> Result<(), ConfigureError> {
        let receipt = self.receiver.setSwitchboard(switchboard).send().await?.get_receipt().await?;
        info!(tx = %receipt.transaction_hash, "set oracle contract");
        let receipt = self.receiver.setFunctionId(function_id).send().await?.get_receipt().await?;
        info!(tx = %receipt.transaction_hash, "set function id");
        Ok(())
    }

    /// Read every feed registered on the receiver.
    pub async fn feeds(&self) -> Result<Vec<PushReceiver::Feed>, alloy::contract::Error> {
        self.receiver.getAllFeeds().call().await
    }

    /// The receiver's current values, keyed by feed name.
    pub async fn current_values(&self) -> Result<FeedValues, alloy::contract::Error> {
        Ok(self
            .feeds()
            .await?
            .into_iter()
            .map(|feed| (feed.feedName, feed.latestResult.value))
            .collect())
    }

    /// Fetch fresh values, select updates and emit them through `runner`.
    #[instrument(skip_all, fields(receiver = %self.receiver.address()))]
    pub async fn run<R: FunctionRunner>(
        &self,
        runner: R,
    ) -> Result<UpdatePlan, PushError<R::Error>> {
        let current = self.current_values().await?;
        let fresh = fetch_feeds(&self.sources).await.map_err(|e| {
            warn!(%e, "no fresh feed data");
            PushError::NoSamples
        })?;

        let plan = UpdatePlan::select(&current, fresh, &mut rand::thread_rng());
        let expiration = expiration_from_now(PUSH_EXPIRATION_SECONDS);
        let txs = plan.transactions(*self.receiver.address(), expiration);

        runner.emit(txs, expiration, PUSH_GAS_LIMIT.to_string()).await.map_err(PushError::Runner)?;
        info!(
            registering = plan.registering,
            updates = plan.names.len(),
            missing = plan.missing.len(),
            "pushed feeds"
        );
        Ok(plan)
    }
}
