use alloy::rpc::types::TransactionRequest;
use oracle_runner::{Emission, FunctionRunner};
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error)]
#[error("mock runner refused the batch")]
pub struct MockRunnerError;

/// A [`FunctionRunner`] that records every emitted batch.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    emissions: Arc<Mutex<Vec<Emission>>>,
    fail: bool,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runner whose `emit` always fails.
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    /// All recorded emissions, oldest first.
    pub fn emissions(&self) -> Vec<Emission> {
        self.emissions.lock().unwrap().clone()
    }

    /// The most recent emission.
    pub fn last(&self) -> Option<Emission> {
        self.emissions.lock().unwrap().last().cloned()
    }

    /// Transactions across all emissions.
    pub fn transactions(&self) -> Vec<TransactionRequest> {
        self.emissions().into_iter().flat_map(|e| e.transactions).collect()
    }
}

impl FunctionRunner for MockRunner {
    type Error = MockRunnerError;

    async fn emit(
        &self,
        transactions: Vec<TransactionRequest>,
        expiration_seconds: u64,
        gas_limit: String,
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockRunnerError);
        }
        self.emissions.lock().unwrap().push(Emission {
            expiration_time_seconds: expiration_seconds,
            gas_limit,
            transactions,
        });
        Ok(())
    }
}
