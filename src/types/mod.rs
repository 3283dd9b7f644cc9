//! Request and response value types.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Model`] / [`AspectRatio`] | Catalog identifiers backed by lookup tables |
//! | [`GenerateOptions`] | Tunable parameters for one generation |
//! | [`GenerateRequest`] | Validated request; builds the wire payload |
//! | [`GenerateResponse`] | Parsed images and credit accounting |
//! | [`GenerationJob`] | Optional submission/completion tracking |

pub mod catalog;
pub mod job;
pub mod request;
pub mod response;

pub use catalog::{AspectRatio, AspectRatioInfo, Model, ModelInfo, ASPECT_RATIOS, MODELS};
pub use job::GenerationJob;
pub use request::{GenerateOptions, GenerateRequest, MAX_OUTPUTS, MAX_PROMPT_CHARS, MIN_OUTPUTS};
pub use response::{GenerateResponse, ImageResult};
