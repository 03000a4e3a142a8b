//! Unified error type for database operations.

use thiserror::Error;

use super::auth::AuthError;
use crate::traits::HttpError;

/// Type alias for Results using [`FirebaseError`].
pub type FirebaseResult<T> = Result<T, FirebaseError>;

/// Errors returned by database reference operations.
///
/// Watch establishment failures are reported with this type as well; once a
/// stream is running, failures are delivered as terminal events instead.
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// The request could not be sent or its body could not be read.
    #[error("firebase: could not execute request: {0}")]
    Http(#[from] HttpError),

    /// The server answered with a non-2xx status.
    #[error("firebase: {message} ({status})")]
    Server { status: u16, message: String },

    /// A value could not be encoded to, or decoded from, JSON.
    #[error("firebase: json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The database URL, or a URL derived from it, is invalid.
    #[error("firebase: invalid url: {0}")]
    InvalidUrl(String),

    /// Credentials could not be loaded or an access token could not be obtained.
    #[error("firebase: {0}")]
    Auth(#[from] AuthError),

    /// The configuration is incomplete or inconsistent.
    #[error("firebase: invalid configuration: {0}")]
    Config(String),

    /// Reading a local file failed.
    #[error("firebase: {0}")]
    Io(#[from] std::io::Error),
}

impl FirebaseError {
    /// HTTP status code for server errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            FirebaseError::Server { status, .. } => Some(*status),
            FirebaseError::Http(HttpError::ServerError { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FirebaseError::Http(err) => !matches!(err, HttpError::InvalidUrl(_)),
            FirebaseError::Server { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            _ => false,
        }
    }
}
