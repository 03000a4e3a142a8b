//! Mock implementations for testing.
//!
//! Enables unit testing of database and streaming code without network access.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with configurable responses and streams

pub mod http;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
