//! Functions shipped with the sandbox.

use crate::{FunctionContext, FunctionError, HttpError, UserFunction};
use alloy::primitives::U256;
use async_trait::async_trait;
use oracle_types::{Integer, RawValue};
use serde_json::value::RawValue as JsonRaw;
use std::collections::BTreeMap;

/// Registry name of [`RandomUint256`].
pub const RANDOM_UINT256: &str = "random-uint256";

/// Registry name of [`ParamsRandomness`].
pub const PARAMS_RANDOMNESS: &str = "params-randomness";

/// Registry name of [`JsonPointer`].
pub const JSON_POINTER: &str = "json-pointer";

/// 32 random bytes read as a big-endian `uint256`.
pub fn random_u256() -> U256 {
    U256::from_be_bytes(rand::random::<[u8; 32]>())
}

/// Returns 32 random bytes as a `uint256`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUint256;

#[async_trait]
impl UserFunction for RandomUint256 {
    async fn run(&self, _ctx: &FunctionContext) -> Result<RawValue, FunctionError> {
        Ok(random_u256().into())
    }
}

/// Serves a randomness order placed on a params receiver.
///
/// Arguments are `[orderId, sender]`. Blocked senders and negative order ids
/// are refused, which resolves the order without a value. An order id that
/// is not an integer literal is refused as an invalid argument.
#[derive(Debug, Clone)]
pub struct ParamsRandomness {
    blocked: Vec<String>,
}

impl Default for ParamsRandomness {
    fn default() -> Self {
        Self::new(["0x0"])
    }
}

impl ParamsRandomness {
    /// Create the function with a list of blocked senders.
    pub fn new<I, S>(blocked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { blocked: blocked.into_iter().map(Into::into).collect() }
    }

    /// True if `sender` is refused.
    pub fn is_blocked(&self, sender: &str) -> bool {
        self.blocked.iter().any(|blocked| blocked.eq_ignore_ascii_case(sender))
    }
}

#[async_trait]
impl UserFunction for ParamsRandomness {
    async fn run(&self, ctx: &FunctionContext) -> Result<RawValue, FunctionError> {
        let order_id = ctx.arg(0)?;
        let sender = ctx.arg(1)?;

        if self.is_blocked(sender) {
            return Err(FunctionError::msg("Sender is blocked"));
        }

        let order_id: Integer = order_id
            .trim()
            .parse()
            .map_err(|e| FunctionError::InvalidArg { index: 0, reason: format!("{e}") })?;
        if order_id.is_negative() {
            return Err(FunctionError::msg("Invalid orderId"));
        }

        ctx.log(&format!("serving order {order_id} for {sender}"));
        Ok(random_u256().into())
    }
}

/// Fetches JSON from a URL and returns the value at a JSON pointer.
///
/// Arguments are `[url, pointer]`; the pointer defaults to the whole
/// document. Integer literals are read exactly, so values too large for the
/// expected return type fail to encode instead of being rounded. Other
/// numbers become floats, and strings text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPointer;

/// Walk `pointer` through `document` without parsing the values on the way.
fn select<'a>(document: &'a JsonRaw, pointer: &str) -> Result<&'a JsonRaw, FunctionError> {
    if pointer.is_empty() {
        return Ok(document);
    }
    let missing = || FunctionError::msg(format!("no value at {pointer:?}"));
    let tokens = pointer.strip_prefix('/').ok_or_else(missing)?;

    let mut current = document;
    for token in tokens.split('/') {
        let token = token.replace("~1", "/").replace("~0", "~");
        current = match current.get().trim_start().as_bytes().first() {
            Some(b'{') => serde_json::from_str::<BTreeMap<String, &JsonRaw>>(current.get())
                .map_err(HttpError::from)?
                .remove(&token)
                .ok_or_else(missing)?,
            Some(b'[') => {
                let index: usize = token.parse().map_err(|_| missing())?;
                serde_json::from_str::<Vec<&JsonRaw>>(current.get())
                    .map_err(HttpError::from)?
                    .get(index)
                    .copied()
                    .ok_or_else(missing)?
            }
            _ => return Err(missing()),
        };
    }
    Ok(current)
}

/// Convert a JSON scalar to a [`RawValue`], keeping integer literals exact.
fn scalar(value: &JsonRaw) -> Result<RawValue, FunctionError> {
    let literal = value.get().trim();
    match literal.as_bytes().first() {
        Some(b'"') => {
            let text: String = serde_json::from_str(literal).map_err(HttpError::from)?;
            Ok(text.into())
        }
        Some(b'-' | b'0'..=b'9') if !literal.contains(['.', 'e', 'E']) => literal
            .parse::<Integer>()
            .map(RawValue::Integer)
            .map_err(|e| FunctionError::msg(e.to_string())),
        Some(b'-' | b'0'..=b'9') => {
            let n: f64 = serde_json::from_str(literal).map_err(HttpError::from)?;
            Ok(RawValue::Float(n))
        }
        _ => Err(FunctionError::msg(format!("unsupported value {literal}"))),
    }
}

#[async_trait]
impl UserFunction for JsonPointer {
    async fn run(&self, ctx: &FunctionContext) -> Result<RawValue, FunctionError> {
        let url = ctx.arg(0)?;
        let pointer = ctx.args().get(1).map(String::as_str).unwrap_or("");

        let response = ctx.http().get(url).await?;
        if !response.is_success() {
            return Err(FunctionError::msg(format!("{url} returned status {}", response.status)));
        }

        let document: &JsonRaw = serde_json::from_slice(&response.body).map_err(HttpError::from)?;
        scalar(select(document, pointer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpClient, HttpLimits, ReqwestTransport};
    use std::sync::Arc;

    fn ctx(args: &[&str]) -> FunctionContext {
        FunctionContext::new(
            args.iter().map(|s| s.to_string()).collect(),
            None,
            HttpClient::new(Arc::new(ReqwestTransport::new()), HttpLimits::new()),
        )
    }

    #[tokio::test]
    async fn blocked_sender_throws() {
        let err = ParamsRandomness::default().run(&ctx(&["1", "0x0"])).await.unwrap_err();
        assert_eq!(err.to_string(), "Sender is blocked");
    }

    #[tokio::test]
    async fn negative_order_id_throws() {
        let err = ParamsRandomness::default().run(&ctx(&["-1", "0xabc"])).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid orderId");
    }

    #[tokio::test]
    async fn missing_sender_is_an_argument_error() {
        let err = ParamsRandomness::default().run(&ctx(&["1"])).await.unwrap_err();
        assert!(matches!(err, FunctionError::MissingArg(1)));
    }

    #[tokio::test]
    async fn serves_valid_order() {
        let value = ParamsRandomness::default().run(&ctx(&["7", "0xabc"])).await.unwrap();
        assert!(matches!(value, RawValue::Integer(i) if !i.is_negative()));
    }

    #[tokio::test]
    async fn non_numeric_order_id_is_an_argument_error() {
        for order_id in ["abc", "12abc", ""] {
            let err =
                ParamsRandomness::default().run(&ctx(&[order_id, "0xabc"])).await.unwrap_err();
            assert!(matches!(err, FunctionError::InvalidArg { index: 0, .. }), "{order_id}");
        }
    }

    fn pick(document: &str, pointer: &str) -> Result<RawValue, FunctionError> {
        let document: &JsonRaw = serde_json::from_str(document).unwrap();
        scalar(select(document, pointer)?)
    }

    #[test]
    fn large_integers_are_read_exactly() {
        let value = pick(r#"{"a":[0,{"b":12345678901234567890123}]}"#, "/a/1/b").unwrap();
        let expected: Integer = "12345678901234567890123".parse().unwrap();
        assert_eq!(value, RawValue::Integer(expected));
        assert_eq!(
            oracle_types::encode_uint256(value).unwrap(),
            U256::from(12345678901234567890123u128)
        );
    }

    #[test]
    fn integers_past_uint256_fail_to_encode() {
        let doc = r#"{"v":115792089237316195423570985008687907853269984665640564039457584007913129639936}"#;
        let value = pick(doc, "/v").unwrap();
        assert!(oracle_types::encode_uint256(value).is_err());

        let value = pick(r#"{"v":-7}"#, "/v").unwrap();
        assert_eq!(value, RawValue::Integer((-7i64).into()));
    }

    #[test]
    fn pointer_tokens_and_scalars() {
        assert_eq!(pick(r#"{"a/b":{"~":"x"}}"#, "/a~1b/~0").unwrap(), RawValue::Text("x".into()));
        assert_eq!(pick(r#"{"p":1.5}"#, "/p").unwrap(), RawValue::Float(1.5));
        assert_eq!(pick("42", "").unwrap(), RawValue::Integer(42u64.into()));
        assert!(pick(r#"{"p":1}"#, "/q").is_err());
        assert!(pick(r#"[1,2]"#, "/5").is_err());
        assert!(pick(r#"{"p":{"q":1}}"#, "/p").is_err());
        assert!(pick(r#"{"p":true}"#, "/p").is_err());
    }

    #[tokio::test]
    async fn random_values_differ() {
        let ctx = ctx(&[]);
        let a = RandomUint256.run(&ctx).await.unwrap();
        let b = RandomUint256.run(&ctx).await.unwrap();
        assert_ne!(a, b);
    }
}
