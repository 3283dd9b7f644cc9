//! Mock HTTP server setup for integration tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use pixeldojo::{Config, PixelDojoClient};
use serde_json::Value;
use std::time::Duration;

pub const TEST_KEY: &str = "test-key";

pub const SUNSET_BODY: &str = r#"{"images":[{"url":"https://x/1.png","seed":5,"width":1024,"height":1024}],"credits_used":1.0,"credits_remaining":99.0}"#;

/// Test fixture that owns a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Client pointed at the mock server. Backoff is clamped to its 1s floor.
    pub fn client(&self, max_retries: u32) -> PixelDojoClient {
        PixelDojoClient::builder()
            .config(Config::default())
            .api_key(TEST_KEY)
            .api_url(&self.base_url)
            .max_retries(max_retries)
            .retry_delay(Duration::from_millis(100))
            .build()
            .expect("client")
    }

    /// `POST /generate` answering `status` with `body`, expected `hits` times.
    pub async fn mock_generate(&mut self, status: usize, body: &str, hits: usize) -> Mock {
        self.server
            .mock("POST", "/generate")
            .match_header("authorization", format!("Bearer {}", TEST_KEY).as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// `POST /generate` for requests whose JSON body contains `partial`.
    pub async fn mock_generate_matching(
        &mut self,
        partial: Value,
        status: usize,
        body: &str,
    ) -> Mock {
        self.server
            .mock("POST", "/generate")
            .match_body(Matcher::PartialJson(partial))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}
