use alloy::{
    primitives::{Address, Bytes},
    providers::{Provider, ProviderBuilder},
    sol_types::SolValue,
    transports::mock::Asserter,
};

pub const RECEIVER: Address = Address::repeat_byte(0x42);
pub const FUNCTION_ID: Address = Address::repeat_byte(0x0f);
pub const SENDER: Address = Address::repeat_byte(0x5e);

/// A provider backed by a mocked transport. Responses pushed to the returned
/// [`Asserter`] are handed out in order.
pub fn mocked_provider() -> (Asserter, impl Provider + Clone) {
    let asserter = Asserter::new();
    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_mocked_client(asserter.clone());
    (asserter, provider)
}

/// Queue an `eth_call` response returning `value`. Functions returning
/// several values must be given them as a tuple of static types.
pub fn push_return<T: SolValue>(asserter: &Asserter, value: T) {
    asserter.push_success(&Bytes::from(value.abi_encode()));
}
