//! Service account key files.
//!
//! The JSON key downloaded from the Google Cloud console. Only the fields
//! needed to sign assertions are kept.

use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use std::path::Path;

use crate::error::AuthError;

/// Token endpoint used when the key file does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Service account credentials.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    private_key: String,
    #[serde(default)]
    pub token_uri: String,
}

impl ServiceAccountCredentials {
    /// Parse and validate a JSON key.
    pub fn from_json(json: &[u8]) -> Result<Self, AuthError> {
        let mut credentials: Self = serde_json::from_slice(json)?;

        for (name, value) in [
            ("project_id", &credentials.project_id),
            ("client_email", &credentials.client_email),
            ("private_key", &credentials.private_key),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::InvalidCredentials(format!("missing {}", name)));
            }
        }

        if credentials.token_uri.is_empty() {
            credentials.token_uri = DEFAULT_TOKEN_URI.to_string();
        }

        Ok(credentials)
    }

    /// Read and validate a JSON key file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let json = std::fs::read(path)?;
        Self::from_json(&json)
    }

    /// URL of the project's default database.
    pub fn database_url(&self) -> String {
        format!("https://{}.firebaseio.com/", self.project_id)
    }

    /// PEM-encoded RSA private key.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub(crate) fn encoding_key(&self) -> Result<EncodingKey, AuthError> {
        Ok(EncodingKey::from_rsa_pem(self.private_key.as_bytes())?)
    }
}

impl std::fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}
