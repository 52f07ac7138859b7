use crate::{poll_until, PollConfig, PollError};
use alloy::{
    network::Ethereum,
    primitives::{Address, U256},
    providers::{PendingTransactionError, Provider},
};
use oracle_bindings::ParamsReceiver::{self, ParamsReceiverInstance};
use tracing::{info, instrument};

/// Status of an order on a params receiver.
pub type OrderStatus = ParamsReceiver::ordersReturn;

/// Errors returned by [`OrderClient`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum OrderError {
    /// A contract call failed.
    #[error("contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),
    /// Waiting for a transaction receipt failed.
    #[error("failed to confirm transaction: {0}")]
    Pending(#[from] PendingTransactionError),
    /// The order transaction did not emit `OrderCreated`.
    #[error("transaction {0} did not emit OrderCreated")]
    MissingEvent(alloy::primitives::TxHash),
    /// The order was not filled in time.
    #[error("order {order_id} not filled: {source}")]
    NotFilled {
        /// The order that was being awaited.
        order_id: U256,
        /// Why waiting stopped.
        #[source]
        source: PollError<alloy::contract::Error>,
    },
}

/// Creates orders on a params receiver and waits for them to be filled.
#[derive(Debug, Clone)]
pub struct OrderClient<P> {
    receiver: ParamsReceiverInstance<P>,
    poll: PollConfig,
}

impl<P> OrderClient<P>
where
    P: Provider<Ethereum>,
{
    /// Create a client for the receiver at `address`.
    pub fn new(address: Address, provider: P, poll: PollConfig) -> Self {
        Self { receiver: ParamsReceiver::new(address, provider), poll }
    }

    /// Get the receiver address.
    pub fn address(&self) -> &Address {
        self.receiver.address()
    }

    /// Get the poll configuration.
    pub const fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// True if the receiver has been initialized with a function id.
    pub async fn is_initialized(&self) -> Result<bool, OrderError> {
        self.receiver.isInitialized().call().await.map_err(Into::into)
    }

    /// Initialize the receiver with `function_id`, if it is not initialized
    /// yet. Returns `true` if an initialization transaction was sent.
    #[instrument(skip(self))]
    pub async fn ensure_initialized(&self, function_id: Address) -> Result<bool, OrderError> {
        if self.is_initialized().await? {
            return Ok(false);
        }
        let receipt = self.receiver.initialize(function_id).send().await?.get_receipt().await?;
        info!(tx = %receipt.transaction_hash, "initialized receiver");
        Ok(true)
    }

    /// Create an order paying `value`, returning the `OrderCreated` event.
    #[instrument(skip(self))]
    pub async fn create_order(
        &self,
        value: U256,
    ) -> Result<ParamsReceiver::OrderCreated, OrderError> {
        let receipt = self.receiver.createOrder().value(value).send().await?.get_receipt().await?;

        let created = receipt
            .inner
            .logs()
            .iter()
            .find_map(|log| log.log_decode::<ParamsReceiver::OrderCreated>().ok())
            .map(|log| log.inner.data)
            .ok_or(OrderError::MissingEvent(receipt.transaction_hash))?;

        info!(order_id = %created.orderId, call_id = %created.callId, "order created");
        Ok(created)
    }

    /// Read an order's status.
    pub async fn order(&self, order_id: U256) -> Result<OrderStatus, OrderError> {
        self.receiver.orders(order_id).call().await.map_err(Into::into)
    }

    /// Wait until the order's `filled` flag is set, polling with the
    /// client's [`PollConfig`].
    #[instrument(skip(self))]
    pub async fn await_filled(&self, order_id: U256) -> Result<OrderStatus, OrderError> {
        poll_until(&self.poll, || async {
            let status = self.receiver.orders(order_id).call().await?;
            Ok::<_, alloy::contract::Error>(status.filled.then_some(status))
        })
        .await
        .map_err(|source| OrderError::NotFilled { order_id, source })
    }
}
