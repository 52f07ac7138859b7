use crate::FunctionRunner;
use alloy::rpc::types::TransactionRequest;
use serde::{Deserialize, Serialize};
use std::{
    io::{self, Write},
    sync::Mutex,
};
use tracing::{debug, instrument};

/// Prefix of the line carrying an [`Emission`].
pub const EMIT_PREFIX: &str = "FN_OUT: ";

/// Errors returned by [`WriterRunner`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EmitError {
    /// Serializing the emission failed.
    #[error("failed to serialize emission: {0}")]
    Json(#[from] serde_json::Error),
    /// Writing the emission failed.
    #[error("failed to write emission: {0}")]
    Io(#[from] io::Error),
    /// The output lock was poisoned by a panicking writer.
    #[error("emission output lock poisoned")]
    Poisoned,
    /// The emission line is malformed.
    #[error("malformed emission line")]
    Malformed,
    /// The emission line is not valid hex.
    #[error("failed to decode emission: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// A batch of transactions handed to the broadcaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emission {
    /// Unix time in seconds after which the batch must not land.
    pub expiration_time_seconds: u64,
    /// Gas limit hint for each transaction.
    pub gas_limit: String,
    /// The populated, unsigned transactions.
    pub transactions: Vec<TransactionRequest>,
}

impl Emission {
    /// Encode the emission as a single output line, without a trailing
    /// newline.
    pub fn to_line(&self) -> Result<String, EmitError> {
        let json = serde_json::to_vec(self)?;
        Ok(format!("{EMIT_PREFIX}{}", hex::encode(json)))
    }

    /// Decode an emission from an output line.
    pub fn from_line(line: &str) -> Result<Self, EmitError> {
        let encoded = line.trim_end().strip_prefix(EMIT_PREFIX).ok_or(EmitError::Malformed)?;
        let json = hex::decode(encoded)?;
        serde_json::from_slice(&json).map_err(Into::into)
    }
}

/// A [`FunctionRunner`] that writes each batch as one hex-encoded line to a
/// writer. The broadcaster reads the last such line from the function's
/// output. An empty batch is emitted too, so that pending requests are
/// resolved without a value.
#[derive(Debug)]
pub struct WriterRunner<W> {
    out: Mutex<W>,
}

/// A [`WriterRunner`] writing to standard output.
pub type StdoutRunner = WriterRunner<io::Stdout>;

impl<W> WriterRunner<W> {
    /// Create a runner writing to `out`.
    pub const fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Consume the runner, returning the writer.
    pub fn into_inner(self) -> Result<W, EmitError> {
        self.out.into_inner().map_err(|_| EmitError::Poisoned)
    }
}

impl StdoutRunner {
    /// Create a runner writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> FunctionRunner for WriterRunner<W> {
    type Error = EmitError;

    #[instrument(skip_all, fields(tx_count = transactions.len(), expiration_seconds))]
    async fn emit(
        &self,
        transactions: Vec<TransactionRequest>,
        expiration_seconds: u64,
        gas_limit: String,
    ) -> Result<(), Self::Error> {
        let line = Emission { expiration_time_seconds: expiration_seconds, gas_limit, transactions }
            .to_line()?;

        let mut out = self.out.lock().map_err(|_| EmitError::Poisoned)?;
        writeln!(out, "{line}")?;
        out.flush()?;
        debug!("emitted transaction batch");
        Ok(())
    }
}
