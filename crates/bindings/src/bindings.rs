#![allow(clippy::too_many_arguments)]
#![allow(missing_docs)]
use alloy::primitives::{Address, FixedBytes, I256, U256};

mod transfer {
    alloy::sol!(
        #[derive(Debug, PartialEq, Eq)]
        function transfer(address to, uint256 amount);
    );
}
pub use transfer::transferCall;

mod callback {
    alloy::sol!(
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface CallbackReceiver {
            function callbackUint256(uint256 value) external;
            function callbackInt256(int256 value) external;
            function callbackString(string value) external;
            function callbackBytes(bytes value) external;
        }
    );

    alloy::sol!(
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface RandomnessReceiver {
            function callback(uint256 value) external;
        }
    );
}
pub use callback::{CallbackReceiver, RandomnessReceiver};

mod params {
    use super::*;

    alloy::sol!(
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface ParamsReceiver {
            event OrderCreated(uint256 orderId, address callId, address sender);

            function isInitialized() external view returns (bool);
            function initialize(address functionId) external;
            function createOrder() external payable;
            function orders(uint256 orderId)
                external
                view
                returns (address sender, address callId, bool filled);
        }
    );

    impl Copy for ParamsReceiver::OrderCreated {}

    impl ParamsReceiver::OrderCreated {
        /// Get the order id.
        pub const fn order_id(&self) -> U256 {
            self.orderId
        }

        /// Get the call id the order will be answered on.
        pub const fn call_id(&self) -> Address {
            self.callId
        }

        /// Get the account that created the order.
        pub const fn sender(&self) -> Address {
            self.sender
        }
    }
}
pub use params::ParamsReceiver;

mod push {
    use super::*;

    alloy::sol!(
        #[derive(Debug, PartialEq, Eq)]
        #[sol(rpc)]
        interface PushReceiver {
            struct FeedResult {
                int256 value;
                uint256 startedAt;
                uint256 updatedAt;
            }

            struct Feed {
                bytes32 feedName;
                uint256 feedId;
                FeedResult latestResult;
            }

            function getAllFeeds() external view returns (Feed[] memory);
            function callback(bytes32[] feedNames, int256[] values, uint256 expiration) external;
            function failureCallback(bytes32[] feedNames) external;
            function setSwitchboard(address switchboard) external;
            function setFunctionId(address functionId) external;
        }
    );

    impl PushReceiver::Feed {
        /// Get the feed name as a string.
        pub fn name(&self) -> String {
            bytes32_to_string(self.feedName)
        }

        /// Get the feed id.
        pub const fn id(&self) -> U256 {
            self.feedId
        }

        /// Get the latest value reported for the feed.
        pub const fn latest_value(&self) -> I256 {
            self.latestResult.value
        }
    }
}
pub use push::PushReceiver;

/// Decode a right-padded `bytes32` string, dropping trailing NUL bytes.
pub fn bytes32_to_string(value: FixedBytes<32>) -> String {
    let end = value.iter().rposition(|b| *b != 0).map_or(0, |idx| idx + 1);
    String::from_utf8_lossy(&value[..end]).into_owned()
}

/// Encode a string as a right-padded `bytes32`, truncating anything beyond 32
/// bytes.
pub fn string_to_bytes32(value: &str) -> FixedBytes<32> {
    let mut out = [0u8; 32];
    let len = value.len().min(32);
    out[..len].copy_from_slice(&value.as_bytes()[..len]);
    FixedBytes(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::{SolCall, SolEvent};

    #[test]
    fn bytes32_names_round_trip() {
        let name = string_to_bytes32("BTC/USD");
        assert_eq!(&name[..7], b"BTC/USD");
        assert!(name[7..].iter().all(|b| *b == 0));
        assert_eq!(bytes32_to_string(name), "BTC/USD");
        assert_eq!(bytes32_to_string(FixedBytes::ZERO), "");
    }

    #[test]
    fn long_names_are_truncated() {
        let long = "A".repeat(40);
        assert_eq!(bytes32_to_string(string_to_bytes32(&long)), "A".repeat(32));
    }

    #[test]
    fn callback_selectors_differ_by_type() {
        let uint = CallbackReceiver::callbackUint256Call { value: U256::from(42) }.abi_encode();
        let int = CallbackReceiver::callbackInt256Call { value: I256::ONE }.abi_encode();
        assert_eq!(uint.len(), 36);
        assert_ne!(uint[..4], int[..4]);
        assert_eq!(
            CallbackReceiver::callbackUint256Call::SIGNATURE,
            "callbackUint256(uint256)"
        );
    }

    #[test]
    fn order_created_accessors() {
        let event = ParamsReceiver::OrderCreated {
            orderId: U256::from(7),
            callId: Address::repeat_byte(0x11),
            sender: Address::repeat_byte(0x22),
        };
        assert_eq!(event.order_id(), U256::from(7));
        assert_eq!(event.call_id(), Address::repeat_byte(0x11));

        let large = ParamsReceiver::OrderCreated { orderId: U256::MAX, ..event };
        assert_eq!(large.order_id(), U256::MAX);
        assert_eq!(event.sender(), Address::repeat_byte(0x22));
        assert_eq!(
            ParamsReceiver::OrderCreated::SIGNATURE,
            "OrderCreated(uint256,address,address)"
        );
    }
}
