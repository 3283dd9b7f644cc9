//! Blocking facade over [`PixelDojoClient`].
//!
//! Each [`PixelDojoSyncClient`] owns one private single-threaded runtime,
//! built on first use and reused until [`close`](PixelDojoSyncClient::close).
//! Calling it from inside an async runtime fails fast with
//! [`Error::Usage`](crate::Error::Usage) instead of deadlocking.

use crate::client::{BatchProgressFn, CancelHandle, PixelDojoClient, ProgressFn};
use crate::config::Config;
use crate::types::{GenerateOptions, GenerateResponse};
use crate::{Error, Result};
use bytes::Bytes;
use std::path::Path;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::debug;

pub struct PixelDojoSyncClient {
    inner: PixelDojoClient,
    runtime: Option<Runtime>,
}

fn ensure_runtime(slot: &mut Option<Runtime>) -> Result<&Runtime> {
    if Handle::try_current().is_ok() {
        return Err(Error::usage(
            "Cannot use the blocking client from within an async runtime; use PixelDojoClient instead",
        ));
    }
    if slot.is_none() {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        debug!("started blocking client runtime");
        *slot = Some(runtime);
    }
    slot.as_ref()
        .ok_or_else(|| Error::usage("blocking client runtime unavailable"))
}

impl PixelDojoSyncClient {
    /// Client configured from [`Config::load`].
    pub fn new() -> Result<Self> {
        Ok(Self::from_client(PixelDojoClient::new()?))
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let client = PixelDojoClient::builder().config(config).build()?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: PixelDojoClient) -> Self {
        Self {
            inner: client,
            runtime: None,
        }
    }

    pub fn client(&self) -> &PixelDojoClient {
        &self.inner
    }

    pub fn has_runtime(&self) -> bool {
        self.runtime.is_some()
    }

    /// Start the runtime and open the pool ahead of the first call.
    pub fn open(&mut self) -> Result<()> {
        let runtime = ensure_runtime(&mut self.runtime)?;
        let _guard = runtime.enter();
        self.inner.open()
    }

    pub fn generate(
        &mut self,
        prompt: &str,
        options: &GenerateOptions,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> Result<GenerateResponse> {
        let runtime = ensure_runtime(&mut self.runtime)?;
        runtime.block_on(self.inner.generate(prompt, options, on_progress))
    }

    pub fn generate_with_cancel(
        &mut self,
        prompt: &str,
        options: &GenerateOptions,
        on_progress: Option<&ProgressFn<'_>>,
        cancel: Option<&CancelHandle>,
    ) -> Result<GenerateResponse> {
        let runtime = ensure_runtime(&mut self.runtime)?;
        runtime.block_on(
            self.inner
                .generate_with_cancel(prompt, options, on_progress, cancel),
        )
    }

    pub fn generate_batch<S: AsRef<str>>(
        &mut self,
        prompts: &[S],
        options: &GenerateOptions,
        max_concurrent: usize,
        on_progress: Option<&BatchProgressFn<'_>>,
    ) -> Result<Vec<Result<GenerateResponse>>> {
        let runtime = ensure_runtime(&mut self.runtime)?;
        Ok(runtime.block_on(self.inner.generate_batch(
            prompts,
            options,
            max_concurrent,
            on_progress,
        )))
    }

    pub fn download_image(&mut self, url: &str, destination: Option<&Path>) -> Result<Bytes> {
        let runtime = ensure_runtime(&mut self.runtime)?;
        runtime.block_on(self.inner.download_image(url, destination))
    }

    /// Close the pool and tear down the runtime. Idempotent; a later call
    /// starts a fresh runtime.
    pub fn close(&mut self) {
        self.inner.close();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            debug!("stopped blocking client runtime");
        }
    }
}

impl Drop for PixelDojoSyncClient {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn offline() -> PixelDojoSyncClient {
        let config = Config {
            api_key: "k".into(),
            api_url: "http://127.0.0.1:9".into(),
            max_retries: 0,
            ..Config::default()
        };
        PixelDojoSyncClient::from_config(config).unwrap()
    }

    #[tokio::test]
    async fn test_refuses_to_run_inside_a_runtime() {
        let mut client = offline();
        let err = client
            .generate("a cat", &GenerateOptions::default(), None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(!client.has_runtime());
        client.close();
    }

    #[test]
    fn test_runtime_is_lazy_and_reused() {
        let mut client = offline();
        assert!(!client.has_runtime());

        // Validation fails before any network traffic.
        let err = client
            .generate("", &GenerateOptions::default(), None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(client.has_runtime());

        client.open().unwrap();
        assert!(client.client().is_open());

        client.close();
        assert!(!client.has_runtime());
        assert!(!client.client().is_open());
        client.close();
    }
}
