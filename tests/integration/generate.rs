//! End-to-end generation against a mock server

use crate::integration::mock_server::{MockServerFixture, SUNSET_BODY, TEST_KEY};
use mockito::Matcher;
use pixeldojo::{CancelHandle, ErrorKind, GenerateOptions, ProgressStage};
use serde_json::json;
use std::sync::Mutex;

#[tokio::test]
async fn test_generate_sunset() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", "/generate")
        .match_header("authorization", format!("Bearer {}", TEST_KEY).as_str())
        .match_header("content-type", "application/json")
        .match_header("accept", "application/json")
        .match_header("user-agent", Matcher::Regex("^pixeldojo-rust/".into()))
        .match_body(Matcher::Json(json!({
            "prompt": "A sunset",
            "model": "flux-pro",
            "aspect_ratio": "1:1",
            "num_outputs": 1
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SUNSET_BODY)
        .create_async()
        .await;

    let client = fixture.client(0);
    let response = client
        .generate("A sunset", &GenerateOptions::default(), None)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.len(), 1);
    let image = &response[0];
    assert_eq!(image.url().as_str(), "https://x/1.png");
    assert_eq!(image.seed(), Some(5));
    assert_eq!(image.dimensions(), "1024x1024");
    assert_eq!(response.credits_used(), 1.0);
    assert_eq!(response.credits_remaining(), 99.0);
    assert_eq!(response.image_urls(), vec!["https://x/1.png".to_string()]);
}

#[tokio::test]
async fn test_seed_is_sent_only_when_set() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_generate_matching(json!({"seed": 42, "num_outputs": 2}), 200, SUNSET_BODY)
        .await;

    let client = fixture.client(0);
    let options = GenerateOptions::default()
        .with_num_outputs(2)
        .with_seed(Some(42));
    client.generate("A sunset", &options, None).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_progress_is_ordered_and_ends_at_one() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_generate(200, SUNSET_BODY, 1).await;

    let client = fixture.client(0);
    let seen = Mutex::new(Vec::new());
    let on_progress = |status: &str, fraction: f64| {
        seen.lock().unwrap().push((status.to_string(), fraction));
    };
    client
        .generate("A sunset", &GenerateOptions::default(), Some(&on_progress))
        .await
        .unwrap();

    let seen = seen.into_inner().unwrap();
    let fractions: Vec<f64> = seen.iter().map(|(_, f)| *f).collect();
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(fractions.last().copied(), Some(1.0));
    let expected: Vec<&str> = ProgressStage::ALL.iter().map(|s| s.message()).collect();
    let messages: Vec<&str> = seen.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(messages, expected);
}

#[tokio::test]
async fn test_cancel_during_request_discards_result() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_generate(200, SUNSET_BODY, 1).await;

    let client = fixture.client(0);
    let cancel = CancelHandle::new();
    let seen = Mutex::new(Vec::new());
    let on_progress = |_: &str, fraction: f64| {
        seen.lock().unwrap().push(fraction);
        // Cancel once the request is on its way.
        if fraction >= 0.3 {
            cancel.cancel();
        }
    };
    let err = client
        .generate_with_cancel(
            "A sunset",
            &GenerateOptions::default(),
            Some(&on_progress),
            Some(&cancel),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(seen.into_inner().unwrap(), vec![0.1, 0.3]);
}

#[tokio::test]
async fn test_pool_reopens_after_close() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture.mock_generate(200, SUNSET_BODY, 2).await;

    let client = fixture.client(0);
    let options = GenerateOptions::default();
    client
        .scoped(|c| c.generate("first", &options, None))
        .await
        .unwrap();
    assert!(!client.is_open());

    client
        .generate("second", &GenerateOptions::default(), None)
        .await
        .unwrap();
    assert!(client.is_open());
    client.close();
    client.close();
    assert!(!client.is_open());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unknown_response_keys_are_ignored() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_generate(200, r#"{"images":[],"job_id":"abc","extra":{"x":1}}"#, 1)
        .await;

    let client = fixture.client(0);
    let response = client
        .generate("A sunset", &GenerateOptions::default(), None)
        .await
        .unwrap();
    assert!(response.is_empty());
    assert_eq!(response.credits_used(), 0.0);
    assert_eq!(response.credits_remaining(), 0.0);
    assert!(response.first_image().is_none());
}
