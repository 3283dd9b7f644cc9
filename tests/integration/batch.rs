//! Batch generation over the mock server

use crate::integration::mock_server::{MockServerFixture, SUNSET_BODY};
use pixeldojo::{CancelHandle, ErrorKind, GenerateOptions, GenerateResponse};
use serde_json::json;
use std::sync::Mutex;

#[tokio::test]
async fn test_partial_failure_keeps_input_order() {
    let mut fixture = MockServerFixture::new().await;
    let a = fixture
        .mock_generate_matching(json!({"prompt": "a"}), 200, SUNSET_BODY)
        .await;
    let b = fixture
        .mock_generate_matching(json!({"prompt": "b"}), 402, r#"{"error":"low balance"}"#)
        .await;
    let c = fixture
        .mock_generate_matching(
            json!({"prompt": "c"}),
            200,
            r#"{"images":[{"url":"https://x/c.png"}],"credits_used":2.0,"credits_remaining":97.0}"#,
        )
        .await;

    let client = fixture.client(0);
    let progress = Mutex::new(Vec::new());
    let on_progress = |done: usize, total: usize, response: Option<&GenerateResponse>| {
        progress
            .lock()
            .unwrap()
            .push((done, total, response.is_some()));
    };
    let results = client
        .generate_batch(&["a", "b", "c"], &GenerateOptions::default(), 1, Some(&on_progress))
        .await;

    a.assert_async().await;
    b.assert_async().await;
    c.assert_async().await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().image_urls(), vec!["https://x/1.png"]);
    assert_eq!(
        results[1].as_ref().unwrap_err().kind(),
        ErrorKind::InsufficientCredits
    );
    assert_eq!(results[2].as_ref().unwrap().credits_used(), 2.0);

    // With one slot, completions arrive in input order.
    assert_eq!(
        progress.into_inner().unwrap(),
        vec![(1, 3, true), (2, 3, false), (3, 3, true)]
    );
}

#[tokio::test]
async fn test_invalid_prompt_fails_only_its_slot() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture.mock_generate(200, SUNSET_BODY, 2).await;

    let client = fixture.client(0);
    let prompts = vec!["first".to_string(), "   ".to_string(), "third".to_string()];
    let results = client
        .generate_batch(&prompts, &GenerateOptions::default(), 3, None)
        .await;

    mock.assert_async().await;
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().kind(), ErrorKind::Validation);
    assert!(results[2].is_ok());
}

#[tokio::test]
async fn test_cancelled_batch_reports_nothing() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture.mock_generate(200, SUNSET_BODY, 0).await;

    let client = fixture.client(0);
    let cancel = CancelHandle::new();
    cancel.cancel();
    let calls = Mutex::new(0);
    let on_progress = |_: usize, _: usize, _: Option<&GenerateResponse>| {
        *calls.lock().unwrap() += 1;
    };
    let results = client
        .generate_batch_with_cancel(
            &["a", "b"],
            &GenerateOptions::default(),
            2,
            Some(&on_progress),
            Some(&cancel),
        )
        .await;

    mock.assert_async().await;
    assert_eq!(results.len(), 2);
    assert!(results
        .iter()
        .all(|r| matches!(r.as_ref().map_err(|e| e.kind()), Err(ErrorKind::Cancelled))));
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_empty_batch() {
    let fixture = MockServerFixture::new().await;
    let client = fixture.client(0);
    let prompts: [&str; 0] = [];
    let results = client
        .generate_batch(&prompts, &GenerateOptions::default(), 3, None)
        .await;
    assert!(results.is_empty());
}
