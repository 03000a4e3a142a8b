//! Firebase custom token generation.
//!
//! Custom tokens let a trusted server sign in a client as an arbitrary user.
//! The client exchanges the token with the identity toolkit for an id token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::credentials::ServiceAccountCredentials;
use crate::error::AuthError;

/// Audience of every custom token.
pub const AUDIENCE: &str =
    "https://identitytoolkit.googleapis.com/google.identity.identitytoolkit.v1.IdentityToolkit";

/// Claims of a custom token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Developer claims, visible to security rules as `auth.token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<Value>,
}

/// Signs custom tokens with a service account key.
///
/// # Example
///
/// ```ignore
/// use firebase_rtdb::auth::TokenGenerator;
///
/// let generator = TokenGenerator::from_credentials(&credentials)?
///     .with_user_id("alice");
/// let token = generator.token()?;
/// ```
pub struct TokenGenerator {
    service_account_email: String,
    key: EncodingKey,
    expiration: Duration,
    issued_at: bool,
    not_before: bool,
    user_id: Option<String>,
    claims: Option<Value>,
}

impl TokenGenerator {
    /// Token lifetime, in seconds.
    pub const DEFAULT_EXPIRATION_SECS: i64 = 2 * 3600;

    pub fn from_credentials(credentials: &ServiceAccountCredentials) -> Result<Self, AuthError> {
        Self::from_pem(&credentials.client_email, credentials.private_key().as_bytes())
    }

    pub fn from_pem(service_account_email: impl Into<String>, pem: &[u8]) -> Result<Self, AuthError> {
        Ok(Self {
            service_account_email: service_account_email.into(),
            key: EncodingKey::from_rsa_pem(pem)?,
            expiration: Duration::seconds(Self::DEFAULT_EXPIRATION_SECS),
            issued_at: true,
            not_before: false,
            user_id: None,
            claims: None,
        })
    }

    /// Token lifetime. Zero or less omits `exp` entirely.
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn with_issued_at(mut self, enabled: bool) -> Self {
        self.issued_at = enabled;
        self
    }

    pub fn with_not_before(mut self, enabled: bool) -> Self {
        self.not_before = enabled;
        self
    }

    pub fn with_user_id(mut self, uid: impl Into<String>) -> Self {
        self.user_id = Some(uid.into());
        self
    }

    pub fn with_claims(mut self, claims: Value) -> Self {
        self.claims = Some(claims);
        self
    }

    /// Claims a token signed at `now` would carry.
    pub fn claims(&self, now: DateTime<Utc>) -> Claims {
        let stamp = now.timestamp();
        Claims {
            iss: self.service_account_email.clone(),
            sub: self.service_account_email.clone(),
            aud: AUDIENCE.to_string(),
            iat: self.issued_at.then_some(stamp),
            nbf: self.not_before.then_some(stamp),
            exp: (self.expiration > Duration::zero()).then(|| (now + self.expiration).timestamp()),
            uid: self.user_id.clone(),
            claims: self.claims.clone(),
        }
    }

    /// Sign a token with the configured claims.
    pub fn token(&self) -> Result<String, AuthError> {
        self.token_with(|_| {})
    }

    /// Sign a token after adjusting its claims, e.g. to set a one-off `uid`.
    pub fn token_with(&self, customize: impl FnOnce(&mut Claims)) -> Result<String, AuthError> {
        let mut claims = self.claims(Utc::now());
        customize(&mut claims);
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.key,
        )?)
    }
}

impl std::fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGenerator")
            .field("service_account_email", &self.service_account_email)
            .field("expiration", &self.expiration)
            .field("issued_at", &self.issued_at)
            .field("not_before", &self.not_before)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
