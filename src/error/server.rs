//! Decoding of server-side error responses.
//!
//! The database answers failed requests with a JSON body of the form
//! `{"error": "<message>"}`. Bodies that are empty or not in that shape are
//! still turned into a descriptive [`FirebaseError::Server`].

use serde::{Deserialize, Serialize};

use super::firebase_error::FirebaseError;
use crate::traits::Response;

/// Error body returned by the database REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerErrorBody {
    pub error: String,
}

/// Build a [`FirebaseError::Server`] from a status and raw response body.
pub fn decode_server_error(status: u16, body: &[u8]) -> FirebaseError {
    if body.iter().all(u8::is_ascii_whitespace) {
        return FirebaseError::Server {
            status,
            message: "empty server error".to_string(),
        };
    }

    let message = match serde_json::from_slice::<ServerErrorBody>(body) {
        Ok(decoded) => decoded.error,
        Err(_) => format!("unknown server error: {}", String::from_utf8_lossy(body).trim()),
    };

    FirebaseError::Server { status, message }
}

/// Pass through successful responses, converting anything else to an error.
pub fn check_server_error(response: Response) -> Result<Response, FirebaseError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(decode_server_error(response.status, &response.body))
    }
}
