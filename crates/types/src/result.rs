use alloy::primitives::{Bytes, I256, U256, U512};
use core::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

/// The declared return type of a function request.
///
/// Each return type maps to exactly one encoder and one receiver callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnType {
    /// An unsigned 256-bit integer.
    #[default]
    #[serde(rename = "uint256", alias = "uint")]
    Uint256,
    /// A signed 256-bit integer.
    #[serde(rename = "int256", alias = "int")]
    Int256,
    /// A UTF-8 string.
    #[serde(rename = "string")]
    String,
    /// A raw byte buffer.
    #[serde(rename = "bytes", alias = "Buffer")]
    Bytes,
}

impl ReturnType {
    /// All supported return types.
    pub const ALL: [Self; 4] = [Self::Uint256, Self::Int256, Self::String, Self::Bytes];

    /// The canonical name of the return type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uint256 => "uint256",
            Self::Int256 => "int256",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnType {
    type Err = UnknownReturnType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uint" | "uint256" => Ok(Self::Uint256),
            "int" | "int256" => Ok(Self::Int256),
            "string" => Ok(Self::String),
            "bytes" | "Buffer" => Ok(Self::Bytes),
            other => Err(UnknownReturnType(other.to_string())),
        }
    }
}

/// Error returned when parsing an unknown [`ReturnType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expectedReturnType {0:?} is not one of uint256, int256, string, bytes")]
pub struct UnknownReturnType(pub String);

/// Error returned by the result encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// The value cannot be represented as the expected type.
    #[error("encode {expected} invalid input: {reason}")]
    InvalidInput {
        /// The type the value was being encoded as.
        expected: ReturnType,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

impl EncodeError {
    const fn invalid(expected: ReturnType, reason: &'static str) -> Self {
        Self::InvalidInput { expected, reason }
    }
}

/// Error returned when parsing an [`Integer`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid integer literal {0:?}")]
pub struct ParseIntegerError(String);

/// A signed integer whose magnitude may exceed 256 bits.
///
/// User functions produce these before encoding, so that values just outside
/// the `uint256` and `int256` ranges can be represented and rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Integer {
    negative: bool,
    magnitude: U512,
}

impl Integer {
    /// Zero.
    pub const ZERO: Self = Self { negative: false, magnitude: U512::ZERO };

    /// Create an integer from a sign and magnitude. Negative zero is
    /// normalized to zero.
    pub fn new(negative: bool, magnitude: U512) -> Self {
        Self { negative: negative && !magnitude.is_zero(), magnitude }
    }

    /// Convert a float to an integer, returning `None` if it is not finite or
    /// has a fractional part.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value.fract() != 0.0 {
            return None;
        }
        // `{:.0}` prints the exact decimal expansion of an integral float.
        let magnitude = U512::from_str_radix(&format!("{:.0}", value.abs()), 10).ok()?;
        Some(Self::new(value.is_sign_negative(), magnitude))
    }

    /// True if the integer is below zero.
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// The absolute value.
    pub const fn magnitude(&self) -> U512 {
        self.magnitude
    }

    /// The magnitude, if it fits in 256 bits.
    fn magnitude_u256(&self) -> Option<U256> {
        let limbs = self.magnitude.as_limbs();
        if limbs[4..].iter().any(|limb| *limb != 0) {
            return None;
        }
        Some(U256::from_limbs([limbs[0], limbs[1], limbs[2], limbs[3]]))
    }
}

fn widen(value: U256) -> U512 {
    let limbs = value.as_limbs();
    U512::from_limbs([limbs[0], limbs[1], limbs[2], limbs[3], 0, 0, 0, 0])
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        fmt::Display::fmt(&self.magnitude, f)
    }
}

impl FromStr for Integer {
    type Err = ParseIntegerError;

    /// Parse a decimal or `0x`-prefixed hex literal with an optional leading
    /// `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseIntegerError(s.to_string());
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            Some(hex) if !hex.is_empty() => U512::from_str_radix(hex, 16),
            Some(_) => return Err(err()),
            None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                U512::from_str_radix(digits, 10)
            }
            None => return Err(err()),
        }
        .map_err(|_| err())?;
        Ok(Self::new(negative, magnitude))
    }
}

macro_rules! impl_integer_from_unsigned {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Integer {
            fn from(value: $ty) -> Self {
                Self::new(false, U512::from(value))
            }
        }
    )*};
}

macro_rules! impl_integer_from_signed {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Integer {
            fn from(value: $ty) -> Self {
                Self::new(value < 0, U512::from(value.unsigned_abs()))
            }
        }
    )*};
}

impl_integer_from_unsigned!(u8, u16, u32, u64, u128);
impl_integer_from_signed!(i8, i16, i32, i64, i128);

impl From<U256> for Integer {
    fn from(value: U256) -> Self {
        Self::new(false, widen(value))
    }
}

impl From<I256> for Integer {
    fn from(value: I256) -> Self {
        let (sign, abs) = value.into_sign_and_abs();
        Self::new(sign.is_negative(), widen(abs))
    }
}

/// A value produced by a user function, before it is encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// An integer.
    Integer(Integer),
    /// A floating point number. Only integral values can be encoded.
    Float(f64),
    /// A UTF-8 string.
    Text(String),
    /// A raw byte buffer.
    Bytes(Bytes),
}

impl RawValue {
    /// A short name for the kind of value, used in logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
        }
    }
}

macro_rules! impl_raw_from_integer {
    ($($ty:ty),*) => {$(
        impl From<$ty> for RawValue {
            fn from(value: $ty) -> Self {
                Self::Integer(value.into())
            }
        }
    )*};
}

impl_raw_from_integer!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, U256, I256, Integer);

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Bytes> for RawValue {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value.into())
    }
}

/// An encoded function result, ready to be passed to a receiver callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionResult {
    /// An unsigned 256-bit integer.
    Uint256(U256),
    /// A signed 256-bit integer.
    Int256(I256),
    /// A UTF-8 string.
    String(String),
    /// A raw byte buffer.
    Bytes(Bytes),
}

impl FunctionResult {
    /// The return type of this result.
    pub const fn return_type(&self) -> ReturnType {
        match self {
            Self::Uint256(_) => ReturnType::Uint256,
            Self::Int256(_) => ReturnType::Int256,
            Self::String(_) => ReturnType::String,
            Self::Bytes(_) => ReturnType::Bytes,
        }
    }
}

fn integer_input(value: RawValue, expected: ReturnType) -> Result<Integer, EncodeError> {
    match value {
        RawValue::Integer(int) => Ok(int),
        RawValue::Float(float) => Integer::from_f64(float)
            .ok_or(EncodeError::invalid(expected, "value is not an integer")),
        _ => Err(EncodeError::invalid(expected, "value is not a number")),
    }
}

/// Encode a value as a `uint256`.
///
/// Fails if the value is negative, not an integer, or greater than
/// `2^256 - 1`.
pub fn encode_uint256(value: impl Into<RawValue>) -> Result<U256, EncodeError> {
    const EXPECTED: ReturnType = ReturnType::Uint256;

    let int = integer_input(value.into(), EXPECTED)?;
    if int.is_negative() {
        return Err(EncodeError::invalid(EXPECTED, "value is negative"));
    }
    int.magnitude_u256().ok_or(EncodeError::invalid(EXPECTED, "value exceeds 2^256 - 1"))
}

/// Encode a value as an `int256`.
///
/// Fails if the value is not an integer or lies outside
/// `[-2^255, 2^255 - 1]`. Negative values are encoded in two's complement.
pub fn encode_int256(value: impl Into<RawValue>) -> Result<I256, EncodeError> {
    const EXPECTED: ReturnType = ReturnType::Int256;

    let int = integer_input(value.into(), EXPECTED)?;
    let out_of_range = EncodeError::invalid(EXPECTED, "value outside the int256 range");
    let magnitude = int.magnitude_u256().ok_or(out_of_range)?;

    if int.is_negative() {
        let min_magnitude = U256::from(1u8) << 255;
        if magnitude > min_magnitude {
            return Err(out_of_range);
        }
        Ok(I256::from_raw(U256::ZERO.wrapping_sub(magnitude)))
    } else {
        if magnitude.bit(255) {
            return Err(out_of_range);
        }
        Ok(I256::from_raw(magnitude))
    }
}

/// Encode a string. This is an identity passthrough.
pub fn encode_string(value: impl Into<String>) -> String {
    value.into()
}

/// Encode a raw byte buffer. This is an identity passthrough.
pub fn encode_bytes(value: impl Into<Bytes>) -> Bytes {
    value.into()
}

/// Encode a raw value as the expected return type.
///
/// A value of the wrong kind for the return type is rejected, never coerced.
pub fn encode_result(
    expected: ReturnType,
    value: impl Into<RawValue>,
) -> Result<FunctionResult, EncodeError> {
    match (expected, value.into()) {
        (ReturnType::Uint256, value) => encode_uint256(value).map(FunctionResult::Uint256),
        (ReturnType::Int256, value) => encode_int256(value).map(FunctionResult::Int256),
        (ReturnType::String, RawValue::Text(text)) => {
            Ok(FunctionResult::String(encode_string(text)))
        }
        (ReturnType::Bytes, RawValue::Bytes(bytes)) => {
            Ok(FunctionResult::Bytes(encode_bytes(bytes)))
        }
        (ReturnType::String, _) => Err(EncodeError::invalid(expected, "value is not a string")),
        (ReturnType::Bytes, _) => Err(EncodeError::invalid(expected, "value is not a byte buffer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MAX_UINT256: &str =
        "115792089237316195423570985008687907853269984665640564039457584007913129639935";
    const TWO_POW_256: &str =
        "115792089237316195423570985008687907853269984665640564039457584007913129639936";
    const MAX_INT256: &str =
        "57896044618658097711785492504343953926634992332820282019728792003956564819967";
    const MIN_INT256: &str =
        "-57896044618658097711785492504343953926634992332820282019728792003956564819968";

    fn int(s: &str) -> Integer {
        s.parse().unwrap()
    }

    #[test]
    fn uint256_boundaries() {
        assert_eq!(encode_uint256(0u64).unwrap(), U256::ZERO);
        assert_eq!(encode_uint256(int(MAX_UINT256)).unwrap(), U256::MAX);
        assert!(encode_uint256(int(TWO_POW_256)).is_err());
        assert!(encode_uint256(-1i64).is_err());
    }

    #[test]
    fn uint256_rejects_non_integers() {
        assert!(encode_uint256(1.5f64).is_err());
        assert!(encode_uint256(f64::NAN).is_err());
        assert!(encode_uint256(f64::INFINITY).is_err());
        assert!(encode_uint256("42").is_err());
        assert_eq!(encode_uint256(42.0f64).unwrap(), U256::from(42));
    }

    #[test]
    fn int256_boundaries() {
        assert_eq!(encode_int256(int(MAX_INT256)).unwrap(), I256::MAX);
        assert_eq!(encode_int256(int(MIN_INT256)).unwrap(), I256::MIN);
        let one = U512::from(1u8);
        let above_max = Integer::new(false, int(MAX_INT256).magnitude() + one);
        let below_min = Integer::new(true, int(MIN_INT256).magnitude() + one);
        assert!(encode_int256(above_max).is_err());
        assert!(encode_int256(below_min).is_err());
        assert!(encode_int256(int(MAX_UINT256)).is_err());
    }

    #[test]
    fn int256_negative_is_twos_complement() {
        let encoded = encode_int256(-1i64).unwrap();
        assert_eq!(encoded.into_raw(), U256::MAX);
        assert_eq!(encode_int256(-42i64).unwrap(), I256::try_from(-42i64).unwrap());
    }

    #[test]
    fn encode_error_display() {
        let err = encode_uint256(-1i64).unwrap_err();
        assert_eq!(err.to_string(), "encode uint256 invalid input: value is negative");
    }

    #[test]
    fn encode_result_rejects_mismatched_kinds() {
        assert!(encode_result(ReturnType::String, 42u64).is_err());
        assert!(encode_result(ReturnType::Bytes, "hello").is_err());
        assert!(encode_result(ReturnType::Uint256, vec![1u8, 2, 3]).is_err());
        assert_eq!(
            encode_result(ReturnType::String, "hello").unwrap(),
            FunctionResult::String("hello".to_string())
        );
        assert_eq!(
            encode_result(ReturnType::Bytes, vec![1u8, 2, 3]).unwrap(),
            FunctionResult::Bytes(Bytes::from(vec![1u8, 2, 3]))
        );
    }

    #[test]
    fn return_type_aliases() {
        assert_eq!("uint".parse::<ReturnType>().unwrap(), ReturnType::Uint256);
        assert_eq!("int".parse::<ReturnType>().unwrap(), ReturnType::Int256);
        assert_eq!("Buffer".parse::<ReturnType>().unwrap(), ReturnType::Bytes);
        assert!("bool".parse::<ReturnType>().is_err());

        let parsed: ReturnType = serde_json::from_str("\"Buffer\"").unwrap();
        assert_eq!(parsed, ReturnType::Bytes);
        assert_eq!(serde_json::to_string(&ReturnType::Int256).unwrap(), "\"int256\"");
    }

    #[test]
    fn integer_parsing() {
        assert_eq!(int("-0"), Integer::ZERO);
        assert_eq!(int("0x2a"), Integer::from(42u64));
        assert_eq!(int(" -17 "), Integer::from(-17i64));
        assert!("".parse::<Integer>().is_err());
        assert!("12a".parse::<Integer>().is_err());
        assert!("0x".parse::<Integer>().is_err());
        assert_eq!(int(MIN_INT256).to_string(), MIN_INT256);
    }

    proptest! {
        #[test]
        fn uint256_round_trips(limbs in any::<[u64; 4]>()) {
            let value = U256::from_limbs(limbs);
            prop_assert_eq!(encode_uint256(value).unwrap(), value);
        }

        #[test]
        fn uint256_rejects_negatives(value in i64::MIN..0i64) {
            prop_assert!(encode_uint256(value).is_err());
        }

        #[test]
        fn uint256_rejects_above_max(high in 1u64..) {
            let mut limbs = [0u64; 8];
            limbs[4] = high;
            prop_assert!(encode_uint256(Integer::new(false, U512::from_limbs(limbs))).is_err());
        }

        #[test]
        fn int256_accepts_in_range(limbs in any::<[u64; 4]>()) {
            let value = I256::from_raw(U256::from_limbs(limbs));
            prop_assert_eq!(encode_int256(value).unwrap(), value);
        }

        #[test]
        fn int256_matches_i128(value in any::<i128>()) {
            prop_assert_eq!(encode_int256(value).unwrap(), I256::try_from(value).unwrap());
        }
    }
}
