//! Integration tests with mock HTTP server

pub mod batch;
pub mod download;
pub mod error_handling;
pub mod generate;
pub mod mock_server;
