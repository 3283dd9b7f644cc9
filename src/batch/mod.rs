//! Bounded-concurrency batch execution.
//!
//! [`BatchExecutor`] fans a list of inputs out through an async function with
//! a counting gate, collecting one result per input in input order. Used by
//! [`PixelDojoClient::generate_batch`](crate::PixelDojoClient::generate_batch).

mod executor;

pub use executor::BatchExecutor;
