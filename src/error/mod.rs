//! Error types for Firebase database operations.
//!
//! This module provides:
//!
//! - **`FirebaseError`**: the unified error returned by database operations
//! - **`AuthError`**: service-account credential and token failures
//! - **Server error decoding**: turning non-2xx responses into `FirebaseError::Server`
//!
//! Stream termination is not an error: the realtime engine reports it in-band
//! as a synthesized [`Event`](crate::sse::Event). Only connection
//! establishment surfaces a `FirebaseError`.
//!
//! # Example
//!
//! ```ignore
//! use firebase_rtdb::error::{FirebaseError, FirebaseResult};
//!
//! async fn count_users(db: &DatabaseRef) -> FirebaseResult<usize> {
//!     let users: serde_json::Map<String, serde_json::Value> = db.child("users").get(&[]).await?;
//!     Ok(users.len())
//! }
//! ```

mod auth;
mod firebase_error;
mod server;

pub use auth::AuthError;
pub use firebase_error::{FirebaseError, FirebaseResult};
pub use server::{check_server_error, decode_server_error, ServerErrorBody};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::traits::HttpError;

    #[test]
    fn test_error_unification() {
        let http: FirebaseError = HttpError::ConnectionFailed("refused".to_string()).into();
        let auth: FirebaseError = AuthError::InvalidCredentials("missing key".to_string()).into();
        let io: FirebaseError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "creds.json").into();

        assert!(matches!(http, FirebaseError::Http(_)));
        assert!(matches!(auth, FirebaseError::Auth(_)));
        assert!(matches!(io, FirebaseError::Io(_)));

        for err in [http, auth, io] {
            assert!(err.to_string().starts_with("firebase: "));
        }
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: FirebaseError = json_err.into();
        assert!(matches!(err, FirebaseError::Json(_)));
    }
}
