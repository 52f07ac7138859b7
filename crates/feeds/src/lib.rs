//! Medianized exchange price feeds.
//!
//! Spot prices are sampled from several exchanges, grouped by market,
//! filtered for outliers and rescaled to 18 decimals. The result is compared
//! with what a push receiver already holds to decide which feeds to send.

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

mod aggregate;
pub use aggregate::{
    aggregate, from_fixed, median, robust_median, std_dev, to_fixed, FeedValues, FEED_DECIMALS,
    MIN_SAMPLES,
};

mod pair;
pub use pair::{Pair, PairError};

mod push;
pub use push::{
    fetch_feeds, ConfigureError, FeedPusher, PushError, PUSH_EXPIRATION_SECONDS, PUSH_GAS_LIMIT,
};

mod source;
pub use source::{
    default_sources, BinanceSource, BitstampSource, CoinbaseSource, GateIoSource, HuobiSource,
    KrakenSource, KucoinSource, OkxSource, Sample, SourceError, TickerSource,
};

mod update;
pub use update::{UpdatePlan, MIN_UPDATE_RATIO, REGISTRATION_BATCH_SIZE, UPDATE_BATCH_SIZE};
