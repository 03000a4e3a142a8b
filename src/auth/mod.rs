//! Authentication for database requests.
//!
//! This module provides:
//! - Service account key files
//! - OAuth2 access tokens via the JWT bearer grant
//! - Firebase custom token generation

pub mod credentials;
pub mod service_account;
pub mod tokgen;

pub use credentials::{ServiceAccountCredentials, DEFAULT_TOKEN_URI};
pub use service_account::ServiceAccountTokenSource;
pub use tokgen::{Claims, TokenGenerator};
