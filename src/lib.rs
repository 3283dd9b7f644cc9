//! # pixeldojo
//!
//! Client library for the PixelDojo text-to-image API.
//!
//! ## Overview
//!
//! [`PixelDojoClient`] validates a prompt, sends one authenticated request
//! through a pooled HTTP transport with bounded exponential-backoff retry, and
//! parses the result into a [`GenerateResponse`]. Failures are classified once,
//! at the network boundary, into the closed [`Error`] taxonomy.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixeldojo::{AspectRatio, GenerateOptions, Model, PixelDojoClient};
//!
//! #[tokio::main]
//! async fn main() -> pixeldojo::Result<()> {
//!     let client = PixelDojoClient::builder().api_key("your-api-key").build()?;
//!     let options = GenerateOptions::new()
//!         .with_model(Model::FluxPro)
//!         .with_aspect_ratio(AspectRatio::Landscape16x9);
//!
//!     let response = client
//!         .scoped(|c| c.generate("a lighthouse at dusk", &options, None))
//!         .await?;
//!     for image in &response {
//!         println!("{} ({})", image.url(), image.dimensions());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Async client, builder, progress and cancellation |
//! | [`batch`] | Bounded-concurrency batch execution |
//! | [`blocking`] | Blocking facade with a private runtime |
//! | [`worker`] | Thread-plus-channel workers for UI integration |
//! | [`transport`] | Connection pool, retry engine, status classification |
//! | [`types`] | Request/response models and the model/ratio catalogs |
//! | [`config`] | Layered configuration and keyring storage |
//! | [`error`] | Error taxonomy |

pub mod batch;
pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;
pub mod worker;

pub use blocking::PixelDojoSyncClient;
pub use client::{
    generate, BatchProgressFn, CancelHandle, PixelDojoClient, PixelDojoClientBuilder, ProgressFn,
    ProgressStage,
};
pub use config::Config;
pub use error::{Error, ErrorContext, ErrorKind};
pub use types::{
    AspectRatio, GenerateOptions, GenerateRequest, GenerateResponse, GenerationJob, ImageResult,
    Model,
};
pub use worker::{DownloadWorker, GenerationParams, GenerationWorker, WorkerEvent};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
