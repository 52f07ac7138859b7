use crate::{
    FunctionContext, FunctionError, FunctionRegistry, HttpClient, HttpLimits, HttpTransport,
    RegistryError, UserFunction,
};
use alloy::{
    network::TransactionBuilder,
    primitives::{Address, U256},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use futures_util::future::join_all;
use oracle_bindings::{CallbackReceiver, RandomnessReceiver};
use oracle_runner::{expiration_from_now, FunctionRunner, DEFAULT_GAS_LIMIT};
use oracle_types::{encode_result, FunctionRequest, FunctionResult, RequestConfig};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default number of seconds a callback batch stays valid.
pub const DEFAULT_EXPIRATION_SECONDS: u64 = 120;

/// Build the receiver callback that delivers `result`.
pub fn callback_transaction(receiver: Address, result: &FunctionResult) -> TransactionRequest {
    let data = match result {
        FunctionResult::Uint256(value) => {
            CallbackReceiver::callbackUint256Call { value: *value }.abi_encode()
        }
        FunctionResult::Int256(value) => {
            CallbackReceiver::callbackInt256Call { value: *value }.abi_encode()
        }
        FunctionResult::String(value) => {
            CallbackReceiver::callbackStringCall { value: value.clone() }.abi_encode()
        }
        FunctionResult::Bytes(value) => {
            CallbackReceiver::callbackBytesCall { value: value.clone() }.abi_encode()
        }
    };
    TransactionRequest::default().with_to(receiver).with_input(data)
}

/// Build the `callback(uint256)` that delivers `value` to a randomness
/// receiver.
pub fn randomness_transaction(receiver: Address, value: U256) -> TransactionRequest {
    TransactionRequest::default()
        .with_to(receiver)
        .with_input(RandomnessReceiver::callbackCall { value }.abi_encode())
}

/// Evaluates requests against a configured user function and turns the
/// successful results into receiver callbacks.
///
/// Each request gets a fresh [`FunctionContext`] and therefore a fresh HTTP
/// quota. A request whose function fails, or whose value does not encode as
/// the expected return type, produces no callback.
#[derive(Debug, Clone)]
pub struct CallbackPipeline {
    config: RequestConfig,
    function: Arc<dyn UserFunction>,
    transport: Arc<dyn HttpTransport>,
    receiver: Address,
    chain_id: Option<u64>,
    gas_limit: u64,
    expiration_seconds: u64,
}

impl CallbackPipeline {
    /// Resolve the function named by `config` and build a pipeline that
    /// sends callbacks to `receiver`.
    pub fn new(
        registry: &FunctionRegistry,
        config: RequestConfig,
        transport: Arc<dyn HttpTransport>,
        receiver: Address,
    ) -> Result<Self, RegistryError> {
        let function = registry.resolve(&config)?;
        Ok(Self {
            config,
            function,
            transport,
            receiver,
            chain_id: None,
            gas_limit: DEFAULT_GAS_LIMIT,
            expiration_seconds: DEFAULT_EXPIRATION_SECONDS,
        })
    }

    /// Set the chain id on built callbacks.
    pub const fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Set the gas-limit hint passed to the runner.
    pub const fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Set how long an emitted batch stays valid.
    pub const fn with_expiration_seconds(mut self, seconds: u64) -> Self {
        self.expiration_seconds = seconds;
        self
    }

    /// Get the request configuration.
    pub const fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Get the receiver address.
    pub const fn receiver(&self) -> Address {
        self.receiver
    }

    fn context(&self, request: &FunctionRequest) -> FunctionContext {
        let limits = HttpLimits::new().with_max_response_bytes(self.config.max_response_bytes);
        FunctionContext::new(
            request.params.clone(),
            request.call_id,
            HttpClient::new(self.transport.clone(), limits),
        )
    }

    /// Evaluate one request and encode its value.
    #[instrument(skip_all, fields(call_id = ?request.call_id))]
    pub async fn evaluate(
        &self,
        request: &FunctionRequest,
    ) -> Result<FunctionResult, FunctionError> {
        let ctx = self.context(request);
        let value = self.function.run(&ctx).await?;
        debug!(
            kind = value.kind(),
            http_requests = ctx.http().requests_made(),
            "function returned"
        );
        encode_result(self.config.expected_return_type, value).map_err(Into::into)
    }

    /// Evaluate all requests concurrently, keeping only the successes.
    ///
    /// Failures are logged and dropped. No order is guaranteed between the
    /// returned results.
    pub async fn evaluate_batch(&self, requests: &[FunctionRequest]) -> Vec<FunctionResult> {
        let outcomes = join_all(requests.iter().map(|request| self.evaluate(request))).await;

        outcomes
            .into_iter()
            .zip(requests)
            .filter_map(|(outcome, request)| {
                outcome
                    .inspect_err(|e| {
                        warn!(call_id = ?request.call_id, %e, "request produced no callback")
                    })
                    .ok()
            })
            .collect()
    }

    /// Evaluate all requests and build the callback batch.
    pub async fn build_batch(&self, requests: &[FunctionRequest]) -> Vec<TransactionRequest> {
        self.evaluate_batch(requests)
            .await
            .iter()
            .map(|result| {
                let tx = callback_transaction(self.receiver, result);
                match self.chain_id {
                    Some(chain_id) => tx.with_chain_id(chain_id),
                    None => tx,
                }
            })
            .collect()
    }

    /// Evaluate all requests and emit the callback batch through `runner`.
    /// Returns the number of callbacks emitted.
    #[instrument(skip_all, fields(requests = requests.len(), receiver = %self.receiver))]
    pub async fn run<R: FunctionRunner>(
        &self,
        runner: R,
        requests: &[FunctionRequest],
    ) -> Result<usize, R::Error> {
        let batch = self.build_batch(requests).await;
        let count = batch.len();

        runner
            .emit(batch, expiration_from_now(self.expiration_seconds), self.gas_limit.to_string())
            .await?;

        info!(callbacks = count, dropped = requests.len() - count, "emitted callback batch");
        Ok(count)
    }
}
