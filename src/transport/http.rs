use super::classify::classify_response;
use super::retry::RetryPolicy;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::Method;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};

pub const USER_AGENT: &str = concat!("pixeldojo-rust/", env!("CARGO_PKG_VERSION"));

/// Settings the transport reads once at construction.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub api_key: String,
    /// Base URL without a trailing slash
    pub api_url: String,
    pub timeout: Duration,
    pub max_connections: usize,
    pub retry: RetryPolicy,
}

/// Connection pool plus per-call retry, header, and status handling.
///
/// The pool is created lazily on first use and re-created if found closed.
/// A pool supplied from outside is never closed by the transport.
pub struct HttpTransport {
    settings: TransportSettings,
    pool: Mutex<Option<reqwest::Client>>,
    owns_pool: bool,
    permits: Semaphore,
}

impl HttpTransport {
    pub fn new(settings: TransportSettings) -> Self {
        let permits = Semaphore::new(settings.max_connections.max(1));
        Self {
            settings,
            pool: Mutex::new(None),
            owns_pool: true,
            permits,
        }
    }

    /// Use a caller-owned `reqwest::Client` instead of a lazily built one.
    pub fn with_client(settings: TransportSettings, client: reqwest::Client) -> Self {
        let permits = Semaphore::new(settings.max_connections.max(1));
        Self {
            settings,
            pool: Mutex::new(Some(client)),
            owns_pool: false,
            permits,
        }
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    pub fn owns_pool(&self) -> bool {
        self.owns_pool
    }

    fn build_pool(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.settings.timeout)
            .pool_max_idle_per_host(self.settings.max_connections / 2)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))
    }

    /// Return the pool, opening it if needed.
    pub fn pool(&self) -> Result<reqwest::Client> {
        let mut guard = self.pool.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }
        let client = self.build_pool()?;
        debug!(
            max_connections = self.settings.max_connections,
            "opened connection pool"
        );
        *guard = Some(client.clone());
        Ok(client)
    }

    pub fn is_open(&self) -> bool {
        self.pool
            .lock()
            .map(|g| g.is_some())
            .unwrap_or(false)
    }

    /// Drop an owned pool. Idempotent; a caller-supplied pool is left alone.
    pub fn close(&self) {
        if !self.owns_pool {
            return;
        }
        let mut guard = self.pool.lock().unwrap_or_else(|p| p.into_inner());
        if guard.take().is_some() {
            debug!("closed connection pool");
        }
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        if self.settings.api_key.is_empty() {
            return Err(Error::authentication(
                "API key not configured",
                ErrorContext::new().with_source("transport"),
            ));
        }
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.settings.api_key))
            .map_err(|_| {
                Error::authentication(
                    "API key contains characters not allowed in a header",
                    ErrorContext::new().with_source("transport"),
                )
            })?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(self.settings.timeout)
        } else {
            Error::connection(format!("Connection failed: {}", e))
        }
    }

    /// One authenticated JSON exchange with retry.
    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.settings
            .retry
            .run(|attempt| {
                let method = method.clone();
                async move {
                    debug!(attempt = attempt + 1, path, "sending request");
                    self.attempt_json(method, path, body).await
                }
            })
            .await
    }

    async fn attempt_json(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let headers = self.auth_headers()?;
        let client = self.pool()?;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::connection("Connection pool closed"))?;

        let url = format!("{}{}", self.settings.api_url, path);
        let mut request = client.request(method, &url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        // One wall-clock window covers connect, send and the full body read.
        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, retry_after, text))
        };
        let (status, retry_after, text) =
            match tokio::time::timeout(self.settings.timeout, exchange).await {
                Err(_) => return Err(Error::timeout(self.settings.timeout)),
                Ok(Err(e)) => return Err(self.map_send_error(e)),
                Ok(Ok(parts)) => parts,
            };

        if status >= 400 {
            let err = classify_response(status, retry_after.as_deref(), &text);
            info!(http_status = status, path, error = %err, "request failed");
            return Err(err);
        }

        serde_json::from_str(&text).map_err(|e| {
            Error::api(
                format!("Invalid JSON in response: {}", e),
                ErrorContext::new()
                    .with_status_code(status)
                    .with_response_body(super::classify::parse_error_body(&text))
                    .with_source("transport"),
            )
        })
    }

    /// Plain GET of an arbitrary URL through the shared pool. No auth, no retry.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        let client = self.pool()?;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::connection("Connection pool closed"))?;

        let exchange = async {
            let response = client.get(url).send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        };
        let (status, bytes) = match tokio::time::timeout(self.settings.timeout, exchange).await {
            Err(_) => return Err(Error::timeout(self.settings.timeout)),
            Ok(Err(e)) => return Err(self.map_send_error(e)),
            Ok(Ok(parts)) => parts,
        };

        if !status.is_success() {
            return Err(Error::Connection {
                message: format!("Download failed: HTTP {}", status.as_u16()),
                context: ErrorContext::new()
                    .with_status_code(status.as_u16())
                    .with_source("download"),
            });
        }
        debug!(url, bytes = bytes.len(), "downloaded");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn settings(api_key: &str) -> TransportSettings {
        TransportSettings {
            api_key: api_key.to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(5),
            max_connections: 4,
            retry: RetryPolicy::new(0, Duration::from_secs(1)),
        }
    }

    #[test]
    fn test_headers() {
        let t = HttpTransport::new(settings("sk-test"));
        let h = t.auth_headers().unwrap();
        assert_eq!(h[AUTHORIZATION], "Bearer sk-test");
        assert_eq!(h[CONTENT_TYPE], "application/json");
        assert_eq!(h[ACCEPT], "application/json");
        assert!(USER_AGENT.starts_with("pixeldojo-rust/"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let t = HttpTransport::new(settings(""));
        let err = t
            .request_json(Method::POST, "/generate", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.status_code(), None);
        // No pool was needed.
        assert!(!t.is_open());
    }

    #[test]
    fn test_pool_lifecycle() {
        let t = HttpTransport::new(settings("k"));
        assert!(!t.is_open());
        t.pool().unwrap();
        assert!(t.is_open());
        t.close();
        assert!(!t.is_open());
        t.close();
        t.pool().unwrap();
        assert!(t.is_open());
    }

    #[test]
    fn test_external_pool_is_not_closed() {
        let t = HttpTransport::with_client(settings("k"), reqwest::Client::new());
        assert!(!t.owns_pool());
        t.close();
        assert!(t.is_open());
    }
}
