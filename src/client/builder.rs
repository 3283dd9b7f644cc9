use crate::client::core::PixelDojoClient;
use crate::config::Config;
use crate::transport::{HttpTransport, RetryPolicy, TransportSettings};
use crate::Result;
use std::time::Duration;

/// Builder for [`PixelDojoClient`].
///
/// Every setter is an override on top of a [`Config`]: either the one given
/// to [`config`](Self::config) or, when none is given, [`Config::load`].
#[derive(Default)]
pub struct PixelDojoClientBuilder {
    config: Option<Config>,
    api_key: Option<String>,
    api_url: Option<String>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    retry_delay: Option<Duration>,
    max_connections: Option<usize>,
    http_client: Option<reqwest::Client>,
}

impl PixelDojoClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base configuration. Skips loading files, env and keyring.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// An empty key leaves the configured one in place.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.is_empty() {
            self.api_key = Some(key);
        }
        self
    }

    /// Override the API base URL (mock servers in tests, staging).
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn max_connections(mut self, n: usize) -> Self {
        self.max_connections = Some(n);
        self
    }

    /// Share an existing `reqwest::Client`. The built client will use it as
    /// its pool and never close it.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<PixelDojoClient> {
        let mut config = match self.config {
            Some(c) => c,
            None => Config::load()?,
        };
        if let Some(key) = self.api_key {
            config.api_key = key;
        }
        if let Some(url) = self.api_url {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(t) = self.timeout {
            config.timeout = t.as_secs_f64();
        }
        if let Some(n) = self.max_retries {
            config.max_retries = n;
        }
        if let Some(d) = self.retry_delay {
            config.retry_delay = d.as_secs_f64();
        }
        if let Some(n) = self.max_connections {
            config.max_connections = n;
        }
        config.validate()?;

        let settings = TransportSettings {
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            timeout: config.timeout_duration(),
            max_connections: config.max_connections,
            retry: RetryPolicy::new(config.max_retries, config.retry_delay_duration()),
        };
        let transport = match self.http_client {
            Some(client) => HttpTransport::with_client(settings, client),
            None => HttpTransport::new(settings),
        };
        Ok(PixelDojoClient::from_transport(transport))
    }
}
