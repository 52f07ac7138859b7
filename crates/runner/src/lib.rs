//! Transaction construction, submission and polling for oracle functions.
//!
//! Functions build populated, unsigned transactions and hand them to a
//! [`FunctionRunner`] together with an expiration and a gas-limit hint. The
//! runner owns signing and broadcasting.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod emit;
pub use emit::{EmitError, Emission, StdoutRunner, WriterRunner, EMIT_PREFIX};

mod order;
pub use order::{OrderClient, OrderError, OrderStatus};

mod poll;
pub use poll::{poll_until, PollConfig, PollError};

mod traits;
pub use traits::FunctionRunner;

mod transfer;
pub use transfer::{
    TransferParams, ValuePolicy, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE, DEFAULT_TRANSFER_AMOUNT,
};

/// Unix time `offset_seconds` from now, used as a batch expiration.
pub fn expiration_from_now(offset_seconds: u64) -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64 + offset_seconds
}
