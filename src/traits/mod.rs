//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (requests and streaming GETs)
//! - [`TokenSource`] - Bearer tokens attached to database requests

pub mod http;
pub mod token;

pub use http::{ByteStream, Headers, HttpClient, HttpError, Method, Response};
pub use token::{StaticToken, TokenSource};
