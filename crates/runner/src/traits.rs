use alloy::rpc::types::TransactionRequest;
use core::future::Future;

/// A trait for handing a batch of populated transactions to a signer and
/// broadcaster.
///
/// Implementors are responsible for signing, broadcasting and gas estimation.
/// Callers only construct the batch, the expiration and the gas-limit hint.
pub trait FunctionRunner {
    /// The error type returned by emission.
    type Error;

    /// Emit a batch of transactions that must land before
    /// `expiration_seconds`, with `gas_limit` as a hint for the broadcaster.
    fn emit(
        &self,
        transactions: Vec<TransactionRequest>,
        expiration_seconds: u64,
        gas_limit: String,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<T> FunctionRunner for &T
where
    T: FunctionRunner + Sync,
{
    type Error = T::Error;

    fn emit(
        &self,
        transactions: Vec<TransactionRequest>,
        expiration_seconds: u64,
        gas_limit: String,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        T::emit(self, transactions, expiration_seconds, gas_limit)
    }
}
