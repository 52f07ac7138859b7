use alloy::{
    network::TransactionBuilder,
    primitives::{Address, U256},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use oracle_bindings::transferCall;

/// Default gas price, in wei.
pub const DEFAULT_GAS_PRICE: u128 = 100_000;

/// Default gas limit.
pub const DEFAULT_GAS_LIMIT: u64 = 250_000;

/// Default transfer amount: 0.0001 ether.
pub const DEFAULT_TRANSFER_AMOUNT: U256 = U256::from_limbs([100_000_000_000_000, 0, 0, 0]);

/// How the `value` field of a transfer transaction is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValuePolicy {
    /// Send exactly the transfer amount.
    #[default]
    AmountOnly,
    /// Send the transfer amount plus `gas_limit * gas_price`.
    IncludeGasBudget,
}

/// Parameters for a `transfer(address,uint256)` call.
///
/// Building is deterministic: identical parameters produce identical
/// transactions, and no gas estimation is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParams {
    from: Address,
    target: Address,
    recipient: Address,
    amount: U256,
    gas_price: u128,
    gas_limit: u64,
    chain_id: u64,
    value_policy: ValuePolicy,
}

impl TransferParams {
    /// Create transfer parameters with default amount and gas settings.
    pub const fn new(from: Address, target: Address, recipient: Address, chain_id: u64) -> Self {
        Self {
            from,
            target,
            recipient,
            amount: DEFAULT_TRANSFER_AMOUNT,
            gas_price: DEFAULT_GAS_PRICE,
            gas_limit: DEFAULT_GAS_LIMIT,
            chain_id,
            value_policy: ValuePolicy::AmountOnly,
        }
    }

    /// Set the transfer amount.
    pub const fn with_amount(mut self, amount: U256) -> Self {
        self.amount = amount;
        self
    }

    /// Set the gas price.
    pub const fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Set the gas limit.
    pub const fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Set the value policy.
    pub const fn with_value_policy(mut self, value_policy: ValuePolicy) -> Self {
        self.value_policy = value_policy;
        self
    }

    /// Get the gas limit.
    pub const fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// The `value` field of the built transaction.
    pub fn value(&self) -> U256 {
        match self.value_policy {
            ValuePolicy::AmountOnly => self.amount,
            ValuePolicy::IncludeGasBudget => self.amount.saturating_add(
                U256::from(self.gas_limit).saturating_mul(U256::from(self.gas_price)),
            ),
        }
    }

    /// Build the unsigned transaction.
    pub fn build(&self) -> TransactionRequest {
        let data = transferCall { to: self.recipient, amount: self.amount }.abi_encode();

        TransactionRequest::default()
            .with_from(self.from)
            .with_to(self.target)
            .with_value(self.value())
            .with_gas_price(self.gas_price)
            .with_gas_limit(self.gas_limit)
            .with_input(data)
            .with_chain_id(self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::utils::parse_ether;

    fn params() -> TransferParams {
        TransferParams::new(
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
            Address::repeat_byte(0x03),
            1,
        )
    }

    #[test]
    fn default_amount_is_a_ten_thousandth_of_an_ether() {
        assert_eq!(DEFAULT_TRANSFER_AMOUNT, parse_ether("0.0001").unwrap());
    }

    #[test]
    fn value_is_amount_by_default() {
        let tx = params().build();
        assert_eq!(tx.value, Some(DEFAULT_TRANSFER_AMOUNT));
        assert_eq!(tx.gas, Some(DEFAULT_GAS_LIMIT));
        assert_eq!(tx.gas_price, Some(DEFAULT_GAS_PRICE));
        assert_eq!(tx.chain_id, Some(1));
        assert_eq!(tx.from, Some(Address::repeat_byte(0x01)));
    }

    #[test]
    fn gas_budget_policy_adds_gas_cost() {
        let params = params().with_value_policy(ValuePolicy::IncludeGasBudget);
        let expected = DEFAULT_TRANSFER_AMOUNT + U256::from(250_000u64 * 100_000u64);
        assert_eq!(params.value(), expected);
        assert_eq!(params.build().value, Some(expected));
    }

    #[test]
    fn encodes_transfer_call() {
        let tx = params().with_amount(U256::from(5)).build();
        let input = tx.input.input().unwrap();
        let decoded = transferCall::abi_decode(input).unwrap();
        assert_eq!(decoded.to, Address::repeat_byte(0x03));
        assert_eq!(decoded.amount, U256::from(5));
    }

    #[test]
    fn build_is_deterministic() {
        assert_eq!(params().build(), params().build());
    }
}
