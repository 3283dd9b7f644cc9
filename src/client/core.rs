use crate::batch::BatchExecutor;
use crate::client::builder::PixelDojoClientBuilder;
use crate::client::progress::ProgressStage;
use crate::client::types::{is_cancelled, BatchProgressFn, CancelHandle, ProgressFn};
use crate::transport::HttpTransport;
use crate::types::{GenerateOptions, GenerateRequest, GenerateResponse};
use crate::{Error, Result};
use bytes::Bytes;
use reqwest::Method;
use std::future::Future;
use std::path::Path;
use tracing::{debug, info};

const GENERATE_PATH: &str = "/generate";

/// Async client for the PixelDojo image API.
///
/// All calls made through one client share its connection pool. The pool is
/// opened lazily and re-opened transparently after [`close`](Self::close).
pub struct PixelDojoClient {
    transport: HttpTransport,
}

/// Keeps the pool open for its lifetime and closes it on drop.
///
/// Returned by [`PixelDojoClient::session`].
#[must_use = "the pool is closed as soon as the session is dropped"]
pub struct Session<'a> {
    client: &'a PixelDojoClient,
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.client.close();
    }
}

impl PixelDojoClient {
    /// Client configured from [`Config::load`](crate::Config::load).
    pub fn new() -> Result<Self> {
        PixelDojoClientBuilder::new().build()
    }

    pub fn builder() -> PixelDojoClientBuilder {
        PixelDojoClientBuilder::new()
    }

    pub(crate) fn from_transport(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn api_key(&self) -> &str {
        &self.transport.settings().api_key
    }

    pub fn api_url(&self) -> &str {
        &self.transport.settings().api_url
    }

    pub fn is_authenticated(&self) -> bool {
        !self.api_key().is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Open the connection pool now rather than on first request.
    pub fn open(&self) -> Result<()> {
        self.transport.pool().map(|_| ())
    }

    /// Release the pool if this client created it. Safe to call repeatedly.
    pub fn close(&self) {
        self.transport.close();
    }

    pub fn session(&self) -> Result<Session<'_>> {
        self.open()?;
        Ok(Session { client: self })
    }

    /// Run `f` with the pool open, closing it afterwards whatever the outcome.
    pub async fn scoped<'a, F, Fut, T>(&'a self, f: F) -> Result<T>
    where
        F: FnOnce(&'a Self) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _session = self.session()?;
        f(self).await
    }

    /// Generate images for `prompt`.
    ///
    /// `on_progress` is called inline at four fixed milestones (see
    /// [`ProgressStage`]) and never after this future completes.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> Result<GenerateResponse> {
        self.generate_with_cancel(prompt, options, on_progress, None)
            .await
    }

    /// [`generate`](Self::generate) with a cancellation flag. Once the flag is
    /// observed, progress stops and the call returns [`Error::Cancelled`]
    /// instead of its result.
    pub async fn generate_with_cancel(
        &self,
        prompt: &str,
        options: &GenerateOptions,
        on_progress: Option<&ProgressFn<'_>>,
        cancel: Option<&CancelHandle>,
    ) -> Result<GenerateResponse> {
        let report = |stage: ProgressStage| -> Result<()> {
            if is_cancelled(cancel) {
                return Err(Error::Cancelled);
            }
            if let Some(cb) = on_progress {
                cb(stage.message(), stage.fraction());
            }
            Ok(())
        };

        let request = GenerateRequest::new(prompt, options)?;
        info!(
            model = request.model().id(),
            aspect_ratio = request.aspect_ratio().id(),
            num_outputs = request.num_outputs(),
            prompt = %request.prompt_preview(),
            "generating"
        );
        let payload = request.to_wire_payload();
        report(ProgressStage::Prepared)?;

        report(ProgressStage::Awaiting)?;
        let outcome = self
            .transport
            .request_json(Method::POST, GENERATE_PATH, Some(&payload))
            .await;
        if is_cancelled(cancel) {
            debug!("discarding result of cancelled generation");
            return Err(Error::Cancelled);
        }
        let body = outcome?;

        report(ProgressStage::Parsing)?;
        let response = GenerateResponse::from_json(body)?;
        info!(
            images = response.len(),
            credits_used = response.credits_used(),
            credits_remaining = response.credits_remaining(),
            "generation complete"
        );
        report(ProgressStage::Done)?;
        Ok(response)
    }

    /// Generate one result per prompt with at most `max_concurrent` requests
    /// in flight. Results are in prompt order; a failed prompt leaves its error
    /// in its slot and does not affect the others.
    pub async fn generate_batch<S: AsRef<str>>(
        &self,
        prompts: &[S],
        options: &GenerateOptions,
        max_concurrent: usize,
        on_progress: Option<&BatchProgressFn<'_>>,
    ) -> Vec<Result<GenerateResponse>> {
        self.generate_batch_with_cancel(prompts, options, max_concurrent, on_progress, None)
            .await
    }

    /// Batch variant of [`generate_with_cancel`](Self::generate_with_cancel).
    /// Prompts still running when the flag is set finish as [`Error::Cancelled`]
    /// and no further progress is reported.
    pub async fn generate_batch_with_cancel<S: AsRef<str>>(
        &self,
        prompts: &[S],
        options: &GenerateOptions,
        max_concurrent: usize,
        on_progress: Option<&BatchProgressFn<'_>>,
        cancel: Option<&CancelHandle>,
    ) -> Vec<Result<GenerateResponse>> {
        let executor = BatchExecutor::new(max_concurrent);
        info!(
            prompts = prompts.len(),
            max_concurrent = executor.max_concurrency(),
            "starting batch"
        );

        let items: Vec<&str> = prompts.iter().map(AsRef::as_ref).collect();
        let results = executor
            .execute(
                items,
                |_, prompt| self.generate_with_cancel(prompt, options, None, cancel),
                |completed, total, result: &Result<GenerateResponse>| {
                    if is_cancelled(cancel) {
                        return;
                    }
                    if let Some(cb) = on_progress {
                        cb(completed, total, result.as_ref().ok());
                    }
                },
            )
            .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(total = results.len(), failed, "batch finished");
        results
    }

    /// Fetch `url` through the client's pool. When `destination` is given the
    /// bytes are also written there, creating parent directories.
    pub async fn download_image(&self, url: &str, destination: Option<&Path>) -> Result<Bytes> {
        let bytes = self.transport.fetch_bytes(url).await?;
        if let Some(path) = destination {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, &bytes).await?;
            info!(path = %path.display(), bytes = bytes.len(), "saved image");
        }
        Ok(bytes)
    }
}

/// One-shot generation with default options.
///
/// Configuration comes from [`Config::load`](crate::Config::load); a non-empty
/// `api_key` overrides it. The pool is released before returning.
pub async fn generate(prompt: &str, api_key: Option<&str>) -> Result<GenerateResponse> {
    let options = GenerateOptions::default();
    let mut builder = PixelDojoClientBuilder::new();
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    let client = builder.build()?;
    client
        .scoped(|c| c.generate(prompt, &options, None))
        .await
}
