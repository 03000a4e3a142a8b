//! Access token source abstraction.
//!
//! Database references ask their token source for a bearer token before every
//! request. Implementations are free to cache.

use async_trait::async_trait;

use crate::error::AuthError;

/// Trait for anything that can hand out an OAuth2 access token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a currently valid access token.
    async fn token(&self) -> Result<String, AuthError>;
}

/// A fixed token, useful for database secrets and tests.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticToken").field(&"<redacted>").finish()
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}
