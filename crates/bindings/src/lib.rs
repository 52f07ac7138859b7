//! Contract bindings for oracle function receivers.
//!
//! Contains the callback interfaces that functions emit transactions against,
//! and the receiver contracts that scripts read from and configure.

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
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod bindings;
pub use bindings::{
    bytes32_to_string, string_to_bytes32, transferCall, CallbackReceiver, ParamsReceiver,
    PushReceiver, RandomnessReceiver,
};
