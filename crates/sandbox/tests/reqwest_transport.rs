use alloy::{primitives::U256, sol_types::SolCall};
use oracle_bindings::CallbackReceiver;
use oracle_sandbox::{
    builtins, CallbackPipeline, FunctionRegistry, HttpClient, HttpError, HttpLimits, HttpRequest,
    ReqwestTransport,
};
use oracle_test_utils::{chain::RECEIVER, runner::MockRunner};
use oracle_types::{FunctionRequest, RequestConfig, ReturnType};
use std::{io::Write, sync::Arc};

#[tokio::test]
async fn sends_query_and_headers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/ticker")
        .match_query(mockito::Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()))
        .match_header("x-api-key", "abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"price":"64000.5"}"#)
        .create_async()
        .await;

    let client = HttpClient::new(Arc::new(ReqwestTransport::new()), HttpLimits::new());
    let response = client
        .request(
            HttpRequest::get(format!("{}/ticker", server.url()))
                .with_query("symbol", "BTCUSDT")
                .with_header("x-api-key", "abc"),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(response.is_success());
    assert_eq!(response.headers.get("content-type").map(String::as_str), Some("application/json"));
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["price"], "64000.5");
    assert_eq!(client.requests_made(), 1);
}

#[tokio::test]
async fn error_statuses_are_responses() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server.mock("GET", "/").with_status(503).create_async().await;

    let client = HttpClient::new(Arc::new(ReqwestTransport::new()), HttpLimits::new());
    let response = client.get(server.url()).await.unwrap();
    assert_eq!(response.status, 503);
    assert!(!response.is_success());
}

#[tokio::test]
async fn oversized_body_is_rejected_from_content_length() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server.mock("GET", "/").with_body("x".repeat(64)).create_async().await;

    let limits = HttpLimits::new().with_max_response_bytes(Some(10));
    let client = HttpClient::new(Arc::new(ReqwestTransport::new()), limits);
    let err = client.get(server.url()).await.unwrap_err();
    assert!(matches!(err, HttpError::ResponseTooLarge { len: 64, max: 10 }));
}

#[tokio::test]
async fn oversized_chunked_body_stops_reading() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/")
        .with_chunked_body(|w| {
            for _ in 0..8 {
                w.write_all(b"0123456789")?;
            }
            Ok(())
        })
        .create_async()
        .await;

    let limits = HttpLimits::new().with_max_response_bytes(Some(25));
    let client = HttpClient::new(Arc::new(ReqwestTransport::new()), limits);
    let err = client.get(server.url()).await.unwrap_err();
    match err {
        HttpError::ResponseTooLarge { len, max } => {
            assert_eq!(max, 25);
            assert!(len > 25);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn body_at_limit_is_read() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server.mock("GET", "/").with_body("0123456789").create_async().await;

    let limits = HttpLimits::new().with_max_response_bytes(Some(10));
    let client = HttpClient::new(Arc::new(ReqwestTransport::new()), limits);
    let response = client.get(server.url()).await.unwrap();
    assert_eq!(response.text(), "0123456789");
}

#[tokio::test]
async fn json_pointer_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/price")
        .with_status(200)
        .with_body(r#"{"data":{"price":42}}"#)
        .create_async()
        .await;

    let config = RequestConfig::inline(builtins::JSON_POINTER, ReturnType::Uint256)
        .with_args([format!("{}/price", server.url()), "/data/price".to_string()]);
    let pipeline = CallbackPipeline::new(
        &FunctionRegistry::with_builtins(),
        config.clone(),
        Arc::new(ReqwestTransport::new()),
        RECEIVER,
    )
    .unwrap();

    let runner = MockRunner::new();
    let requests = vec![FunctionRequest::new(config.args.iter().cloned())];
    assert_eq!(pipeline.run(&runner, &requests).await.unwrap(), 1);
    mock.assert_async().await;

    let tx = &runner.transactions()[0];
    let call =
        CallbackReceiver::callbackUint256Call::abi_decode(tx.input.input().unwrap()).unwrap();
    assert_eq!(call.value, U256::from(42));
}
