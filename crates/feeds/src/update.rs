use crate::{from_fixed, FeedValues};
use alloy::{
    network::TransactionBuilder,
    primitives::{Address, FixedBytes, I256, U256},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use oracle_bindings::PushReceiver;
use rand::{seq::SliceRandom, Rng};
use rust_decimal::Decimal;
use tracing::debug;

/// Maximum feeds per batch while feeds are still being registered.
pub const REGISTRATION_BATCH_SIZE: usize = 20;

/// Maximum feeds per batch once every feed is registered.
pub const UPDATE_BATCH_SIZE: usize = 100;

/// Updates whose `min / max` ratio against the current value falls below
/// this are discarded as implausible.
pub const MIN_UPDATE_RATIO: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// `min(a, b) / max(a, b)`, or `None` if either side is not representable
/// or the larger side is zero.
fn ratio(current: I256, fresh: I256) -> Option<Decimal> {
    let (a, b) = (from_fixed(current)?, from_fixed(fresh)?);
    a.min(b).checked_div(a.max(b)).map(|r| r.abs())
}

/// The feeds to push in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    /// True while the receiver holds noticeably fewer feeds than are
    /// available. Registration is expensive, so batches are smaller and only
    /// new feeds are sent.
    pub registering: bool,
    /// Feed names to update, parallel to `values`.
    pub names: Vec<FixedBytes<32>>,
    /// New feed values.
    pub values: Vec<I256>,
    /// Feeds on the receiver with no fresh value. Empty while registering.
    pub missing: Vec<FixedBytes<32>>,
}

impl UpdatePlan {
    /// Compare fresh values against the receiver's current values and pick
    /// the updates to send.
    ///
    /// Feeds are registered while `current` has fewer than `fresh - 1`
    /// entries, which lets one new feed be registered alongside normal
    /// updates. While registering, existing feeds are left alone and at most
    /// [`REGISTRATION_BATCH_SIZE`] new feeds are sent in a stable order.
    /// Otherwise updates are shuffled and capped at [`UPDATE_BATCH_SIZE`].
    pub fn select<R: Rng + ?Sized>(current: &FeedValues, fresh: FeedValues, rng: &mut R) -> Self {
        let registering = current.len() + 1 < fresh.len();

        let missing = if registering {
            Vec::new()
        } else {
            current.keys().filter(|name| !fresh.contains_key(*name)).copied().collect()
        };

        let mut updates: Vec<_> = fresh
            .into_iter()
            .filter(|(name, value)| match current.get(name) {
                None => true,
                Some(_) if registering => false,
                Some(existing) => {
                    ratio(*existing, *value).map_or(true, |ratio| ratio >= MIN_UPDATE_RATIO)
                }
            })
            .collect();

        let cap = if registering {
            REGISTRATION_BATCH_SIZE
        } else {
            updates.shuffle(rng);
            UPDATE_BATCH_SIZE
        };
        updates.truncate(cap);

        debug!(
            registering,
            updates = updates.len(),
            missing = missing.len(),
            "selected feed updates"
        );
        let (names, values) = updates.into_iter().unzip();
        Self { registering, names, values, missing }
    }

    /// True if the plan sends nothing.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.missing.is_empty()
    }

    /// Build the receiver transactions: a `callback` with the updates, then a
    /// `failureCallback` for missing feeds if there are any.
    pub fn transactions(&self, receiver: Address, expiration: u64) -> Vec<TransactionRequest> {
        let callback = PushReceiver::callbackCall {
            feedNames: self.names.clone(),
            values: self.values.clone(),
            expiration: U256::from(expiration),
        };
        let tx = |input: Vec<u8>| TransactionRequest::default().with_to(receiver).with_input(input);
        let mut txs = vec![tx(callback.abi_encode())];

        if !self.missing.is_empty() {
            let failure = PushReceiver::failureCallbackCall { feedNames: self.missing.clone() };
            txs.push(tx(failure.abi_encode()));
        }
        txs
    }
}
