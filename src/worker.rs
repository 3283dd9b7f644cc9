//! Background workers for UI integration.
//!
//! Each worker runs one blocking call on its own OS thread and reports back
//! only through a [`WorkerEvent`] channel, so the owning thread never shares
//! client state with it. After [`cancel`](GenerationWorker::cancel) the worker
//! sends nothing further; its in-flight request runs to completion and the
//! result is dropped.

use crate::blocking::PixelDojoSyncClient;
use crate::client::CancelHandle;
use crate::config::Config;
use crate::types::{GenerateOptions, GenerateResponse};
use crate::{Error, Result};
use bytes::Bytes;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::debug;

#[derive(Debug)]
pub enum WorkerEvent {
    Started,
    Progress { status: String, fraction: f64 },
    Finished(GenerateResponse),
    Failed(Error),
    Downloaded { url: String, bytes: Bytes },
    DownloadFailed { url: String, error: Error },
}

/// What a [`GenerationWorker`] should generate.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub prompt: String,
    pub options: GenerateOptions,
}

impl GenerationParams {
    pub fn new(prompt: impl Into<String>, options: GenerateOptions) -> Self {
        Self {
            prompt: prompt.into(),
            options,
        }
    }
}

/// Sends `event` unless the worker has been cancelled.
#[derive(Clone)]
struct Emitter {
    tx: Sender<WorkerEvent>,
    cancel: CancelHandle,
}

impl Emitter {
    fn emit(&self, event: WorkerEvent) {
        if self.cancel.is_cancelled() {
            return;
        }
        // The receiver may already be gone; nobody is listening then.
        let _ = self.tx.send(event);
    }
}

fn spawn_thread<F>(name: &str, body: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    Ok(thread::Builder::new().name(name.to_string()).spawn(body)?)
}

pub struct GenerationWorker {
    events: Receiver<WorkerEvent>,
    cancel: CancelHandle,
    thread: Option<JoinHandle<()>>,
}

impl GenerationWorker {
    pub fn spawn(config: Config, params: GenerationParams) -> Result<Self> {
        let (tx, events) = mpsc::channel();
        let cancel = CancelHandle::new();
        let emitter = Emitter {
            tx,
            cancel: cancel.clone(),
        };

        let thread = spawn_thread("pixeldojo-generate", move || {
            if emitter.cancel.is_cancelled() {
                return;
            }
            emitter.emit(WorkerEvent::Started);

            let progress = {
                let emitter = emitter.clone();
                move |status: &str, fraction: f64| {
                    emitter.emit(WorkerEvent::Progress {
                        status: status.to_string(),
                        fraction,
                    })
                }
            };
            let outcome = PixelDojoSyncClient::from_config(config).and_then(|mut client| {
                client.generate_with_cancel(
                    &params.prompt,
                    &params.options,
                    Some(&progress),
                    Some(&emitter.cancel),
                )
            });
            match outcome {
                Ok(response) => emitter.emit(WorkerEvent::Finished(response)),
                Err(Error::Cancelled) => debug!("generation worker cancelled"),
                Err(e) => emitter.emit(WorkerEvent::Failed(e)),
            }
        })?;

        Ok(Self {
            events,
            cancel,
            thread: Some(thread),
        })
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// Wait for the worker thread to exit.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub struct DownloadWorker {
    events: Receiver<WorkerEvent>,
    cancel: CancelHandle,
    thread: Option<JoinHandle<()>>,
}

impl DownloadWorker {
    pub fn spawn(config: Config, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let (tx, events) = mpsc::channel();
        let cancel = CancelHandle::new();
        let emitter = Emitter {
            tx,
            cancel: cancel.clone(),
        };

        let thread = spawn_thread("pixeldojo-download", move || {
            let outcome = PixelDojoSyncClient::from_config(config)
                .and_then(|mut client| client.download_image(&url, None));
            match outcome {
                Ok(bytes) => emitter.emit(WorkerEvent::Downloaded { url, bytes }),
                Err(error) => emitter.emit(WorkerEvent::DownloadFailed { url, error }),
            }
        })?;

        Ok(Self {
            events,
            cancel,
            thread: Some(thread),
        })
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
