//! Async client.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`PixelDojoClient`] | Generation, batch generation and image download |
//! | [`PixelDojoClientBuilder`] | Overrides layered on [`Config`](crate::Config) |
//! | [`CancelHandle`] | Cooperative cancellation flag |
//! | [`ProgressStage`] | Fixed progress milestones of one generation |

pub mod builder;
pub mod core;
pub mod progress;
pub mod types;

pub use builder::PixelDojoClientBuilder;
pub use core::{generate, PixelDojoClient, Session};
pub use progress::ProgressStage;
pub use types::{BatchProgressFn, CancelHandle, ProgressFn};
