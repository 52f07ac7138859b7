use alloy::{
    primitives::{Address, U256},
    sol_types::SolCall,
};
use async_trait::async_trait;
use oracle_bindings::CallbackReceiver;
use oracle_sandbox::{
    builtins, CallbackPipeline, FunctionContext, FunctionError, FunctionRegistry, UserFunction,
    MAX_HTTP_REQUESTS,
};
use oracle_test_utils::{chain::RECEIVER, http::MockTransport, init_tracing, runner::MockRunner};
use oracle_types::{FunctionRequest, RawValue, RequestConfig, ReturnType};
use std::sync::Arc;

#[derive(Debug)]
struct Returns(RawValue);

#[async_trait]
impl UserFunction for Returns {
    async fn run(&self, _ctx: &FunctionContext) -> Result<RawValue, FunctionError> {
        Ok(self.0.clone())
    }
}

/// Throws when its first argument is `"throw"`, otherwise returns 1.
#[derive(Debug)]
struct Flaky;

#[async_trait]
impl UserFunction for Flaky {
    async fn run(&self, ctx: &FunctionContext) -> Result<RawValue, FunctionError> {
        if ctx.arg(0)? == "throw" {
            return Err(FunctionError::msg("boom"));
        }
        Ok(1u64.into())
    }
}

/// Makes as many HTTP calls as its first argument says, then returns the
/// number made.
#[derive(Debug)]
struct Hammer;

#[async_trait]
impl UserFunction for Hammer {
    async fn run(&self, ctx: &FunctionContext) -> Result<RawValue, FunctionError> {
        let calls: u32 = ctx.arg(0)?.parse().map_err(|_| FunctionError::InvalidArg {
            index: 0,
            reason: "not a count".into(),
        })?;
        for _ in 0..calls {
            ctx.fetch(oracle_sandbox::HttpRequest::get("https://example.com")).await?;
        }
        Ok(ctx.http().requests_made().into())
    }
}

fn registry() -> FunctionRegistry {
    FunctionRegistry::with_builtins()
        .with("forty-two", Returns(42u64.into()))
        .with("text", Returns("hello".into()))
        .with("flaky", Flaky)
        .with("hammer", Hammer)
}

fn pipeline(source: &str, return_type: ReturnType, transport: MockTransport) -> CallbackPipeline {
    CallbackPipeline::new(
        &registry(),
        RequestConfig::inline(source, return_type),
        Arc::new(transport),
        RECEIVER,
    )
    .unwrap()
}

fn decode_uint(tx: &alloy::rpc::types::TransactionRequest) -> U256 {
    CallbackReceiver::callbackUint256Call::abi_decode(tx.input.input().unwrap()).unwrap().value
}

#[tokio::test]
async fn uint256_result_becomes_callback() {
    init_tracing();
    let runner = MockRunner::new();
    let pipeline = pipeline("forty-two", ReturnType::Uint256, MockTransport::failing());

    let count = pipeline.run(&runner, &[FunctionRequest::default()]).await.unwrap();
    assert_eq!(count, 1);

    let emission = runner.last().unwrap();
    assert_eq!(emission.transactions.len(), 1);
    assert_eq!(emission.gas_limit, "250000");
    let tx = &emission.transactions[0];
    assert_eq!(tx.to, Some(RECEIVER.into()));
    assert_eq!(decode_uint(tx), U256::from(42));
}

#[tokio::test]
async fn blocked_sender_yields_no_callbacks() {
    init_tracing();
    let runner = MockRunner::new();
    let pipeline =
        pipeline(builtins::PARAMS_RANDOMNESS, ReturnType::Uint256, MockTransport::failing());

    let request = FunctionRequest::new(["1", "0x0"]).with_call_id(Address::repeat_byte(1));
    let count = pipeline.run(&runner, &[request]).await.unwrap();

    assert_eq!(count, 0);
    let emission = runner.last().unwrap();
    assert!(emission.transactions.is_empty());
}

#[tokio::test]
async fn failed_requests_are_dropped_from_batch() {
    init_tracing();
    let runner = MockRunner::new();
    let pipeline = pipeline("flaky", ReturnType::Uint256, MockTransport::failing());

    let requests: Vec<_> = ["ok", "throw", "ok", "throw", "ok"]
        .into_iter()
        .map(|arg| FunctionRequest::new([arg]))
        .collect();
    let count = pipeline.run(&runner, &requests).await.unwrap();

    assert_eq!(count, 3);
    let txs = runner.transactions();
    assert_eq!(txs.len(), 3);
    assert!(txs.iter().all(|tx| decode_uint(tx) == U256::from(1)));
}

#[tokio::test]
async fn wrong_kind_for_return_type_is_dropped() {
    let pipeline = pipeline("text", ReturnType::Uint256, MockTransport::failing());
    let err = pipeline.evaluate(&FunctionRequest::default()).await.unwrap_err();
    assert!(matches!(err, FunctionError::Encode(_)));

    let pipeline = self::pipeline("text", ReturnType::String, MockTransport::failing());
    assert!(pipeline.evaluate(&FunctionRequest::default()).await.is_ok());
}

#[tokio::test]
async fn each_request_gets_its_own_quota() {
    let transport = MockTransport::json(serde_json::json!({}));
    let pipeline = pipeline("hammer", ReturnType::Uint256, transport.clone());

    let max = MAX_HTTP_REQUESTS.to_string();
    let requests = vec![FunctionRequest::new([max.as_str()]), FunctionRequest::new([max.as_str()])];
    let results = pipeline.evaluate_batch(&requests).await;

    assert_eq!(results.len(), 2);
    assert_eq!(transport.calls(), 2 * MAX_HTTP_REQUESTS as usize);
}

#[tokio::test]
async fn exceeding_quota_fails_the_evaluation() {
    let transport = MockTransport::json(serde_json::json!({}));
    let pipeline = pipeline("hammer", ReturnType::Uint256, transport.clone());

    let over = (MAX_HTTP_REQUESTS + 1).to_string();
    let err = pipeline.evaluate(&FunctionRequest::new([over.as_str()])).await.unwrap_err();

    assert!(matches!(err, FunctionError::Http(e) if e.is_limit()));
    assert_eq!(transport.calls(), MAX_HTTP_REQUESTS as usize);
}

#[tokio::test]
async fn transport_failures_reach_the_function() {
    let pipeline = pipeline("hammer", ReturnType::Uint256, MockTransport::failing());
    let err = pipeline.evaluate(&FunctionRequest::new(["1"])).await.unwrap_err();
    assert!(matches!(err, FunctionError::Http(e) if !e.is_limit()));
}

#[tokio::test]
async fn runner_errors_are_returned() {
    let pipeline = pipeline("forty-two", ReturnType::Uint256, MockTransport::failing());
    assert!(pipeline.run(&MockRunner::failing(), &[FunctionRequest::default()]).await.is_err());
}
