//! Status classification and retry behavior over real HTTP

use crate::integration::mock_server::{MockServerFixture, SUNSET_BODY};
use pixeldojo::{Config, Error, ErrorKind, GenerateOptions, PixelDojoClient};
use std::time::Duration;

#[tokio::test]
async fn test_insufficient_credits() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_generate(402, r#"{"error":"low balance","credits_remaining":0.5}"#, 1)
        .await;

    let client = fixture.client(3);
    let err = client
        .generate("A sunset", &GenerateOptions::default(), None)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::InsufficientCredits);
    assert_eq!(err.credits_remaining(), Some(0.5));
    assert_eq!(err.status_code(), Some(402));
    assert!(err.to_string().contains("0.5"));
    assert!(err.to_string().contains("low balance"));
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", "/generate")
        .with_status(429)
        .with_header("retry-after", "30")
        .with_body(r#"{"error":"slow down"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = fixture.client(3);
    let err = client
        .generate("A sunset", &GenerateOptions::default(), None)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::RateLimit);
    assert_eq!(err.retry_after(), Some(30.0));
    assert!(err.to_string().contains("(retry after 30.0s)"));
}

#[tokio::test]
async fn test_authentication_failure_is_not_retried() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_generate(401, r#"{"error":"invalid key"}"#, 1)
        .await;

    let client = fixture.client(3);
    let err = client
        .generate("A sunset", &GenerateOptions::default(), None)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, Error::Authentication { .. }));
    assert_eq!(err.to_string(), "[401] Authentication failed: invalid key");
}

#[tokio::test]
async fn test_validation_error_names_the_field() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_generate(422, r#"{"error":"bad ratio","field":"aspect_ratio"}"#, 1)
        .await;

    let client = fixture.client(3);
    let err = client
        .generate("A sunset", &GenerateOptions::default(), None)
        .await
        .unwrap_err();

    mock.assert_async().await;
    match err {
        Error::Validation { field, .. } => assert_eq!(field.as_deref(), Some("aspect_ratio")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retried_until_exhausted() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_generate(503, r#"{"error":"overloaded"}"#, 2)
        .await;

    let client = fixture.client(1);
    let err = client
        .generate("A sunset", &GenerateOptions::default(), None)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.status_code(), Some(503));
    assert_eq!(
        err.response_body(),
        Some(&serde_json::json!({"error": "overloaded"}))
    );
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let mut fixture = MockServerFixture::new().await;
    // mockito serves the first matching mock that still has hits left.
    let failing = fixture
        .mock_generate(500, "upstream exploded", 1)
        .await;
    let ok = fixture.mock_generate(200, SUNSET_BODY, 1).await;

    let client = fixture.client(2);
    let response = client
        .generate("A sunset", &GenerateOptions::default(), None)
        .await
        .unwrap();

    failing.assert_async().await;
    ok.assert_async().await;
    assert_eq!(response.len(), 1);
}

#[tokio::test]
async fn test_non_json_error_body_is_wrapped() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_generate(418, "I'm a teapot", 1).await;

    let client = fixture.client(0);
    let err = client
        .generate("A sunset", &GenerateOptions::default(), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(
        err.response_body(),
        Some(&serde_json::json!({"error": "I'm a teapot"}))
    );
    assert!(err.to_string().starts_with("[418] Request failed:"));
}

#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", "/generate")
        .expect(0)
        .create_async()
        .await;

    let client = PixelDojoClient::builder()
        .config(Config::default())
        .api_url(&fixture.base_url)
        .build()
        .unwrap();
    let err = client
        .generate("A sunset", &GenerateOptions::default(), None)
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(err.status_code(), None);
}

#[tokio::test]
async fn test_connection_refused() {
    let client = PixelDojoClient::builder()
        .config(Config::default())
        .api_key("k")
        .api_url("http://127.0.0.1:1")
        .max_retries(0)
        .build()
        .unwrap();
    let err = client
        .generate("A sunset", &GenerateOptions::default(), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.is_retryable());
    assert!(err.to_string().starts_with("Connection failed"));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    // Accepts the connection but never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = PixelDojoClient::builder()
        .config(Config::default())
        .api_key("k")
        .api_url(format!("http://{}", addr))
        .timeout(Duration::from_secs(1))
        .max_retries(3)
        .build()
        .unwrap();
    let err = client
        .generate("A sunset", &GenerateOptions::default(), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(matches!(err, Error::Timeout { timeout, .. } if timeout == Duration::from_secs(1)));
    assert!(!err.is_retryable());
}
