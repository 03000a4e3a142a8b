//! Authentication error types.

use thiserror::Error;

use crate::traits::HttpError;

/// Errors raised while loading credentials or minting tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The service account credentials are missing required fields.
    #[error("invalid service account credentials: {0}")]
    InvalidCredentials(String),

    /// The private key could not be parsed or the token could not be signed.
    #[error("could not sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// The token endpoint rejected the assertion.
    #[error("token exchange failed ({status}): {message}")]
    TokenExchange { status: u16, message: String },

    /// The token endpoint could not be reached.
    #[error("could not reach token endpoint: {0}")]
    Http(#[from] HttpError),

    /// The credentials file or token response was not valid JSON.
    #[error("could not decode json: {0}")]
    Json(#[from] serde_json::Error),

    /// The credentials file could not be read.
    #[error("could not read credentials: {0}")]
    Io(#[from] std::io::Error),
}
