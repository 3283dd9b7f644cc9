//! HTTP transport and retry engine.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`HttpTransport`] | Owns the connection pool; one logical exchange per call |
//! | [`RetryPolicy`] | Bounded exponential backoff for transient failures |
//! | [`classify_response`] | Maps failed responses onto the error taxonomy |

pub mod classify;
pub mod http;
pub mod retry;

pub use classify::{classify_response, parse_error_body};
pub use http::{HttpTransport, TransportSettings, USER_AGENT};
pub use retry::{Decision, RetryPolicy, MAX_BACKOFF, MIN_BACKOFF};
