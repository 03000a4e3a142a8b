//! Database client configuration.
//!
//! A [`DatabaseConfig`] collects everything needed to build the root
//! [`DatabaseRef`](crate::database::DatabaseRef): where the database lives,
//! how to authenticate, and how to talk HTTP.

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::auth::ServiceAccountCredentials;
use crate::database::QueryOption;
use crate::error::{FirebaseError, FirebaseResult};
use crate::traits::{HttpClient, TokenSource};

/// Default capacity of the channel returned by a watch.
pub const DEFAULT_WATCH_BUFFER_LEN: usize = 64;

/// Environment variable holding the database URL.
pub const ENV_URL: &str = "FIREBASE_URL";
/// Environment variable holding the path to a service account key file.
pub const ENV_CREDENTIALS: &str = "FIREBASE_CREDENTIALS";
/// Environment variable overriding the watch channel capacity.
pub const ENV_WATCH_BUFFER: &str = "FIREBASE_WATCH_BUFFER";

/// Configuration for a database client.
///
/// # Example
///
/// ```ignore
/// use firebase_rtdb::config::DatabaseConfig;
/// use firebase_rtdb::database::DatabaseRef;
///
/// let config = DatabaseConfig::new()
///     .with_url("https://my-project.firebaseio.com/")
///     .with_watch_buffer_len(128);
/// let db = DatabaseRef::new(config)?;
/// ```
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Database URL. Derived from the credentials' project id when unset.
    pub url: Option<String>,
    /// Service account used to mint access tokens.
    pub credentials: Option<ServiceAccountCredentials>,
    /// `uid` claim added to the service account assertion.
    pub user_id: Option<String>,
    /// `claims` claim added to the service account assertion.
    pub claims: Option<Value>,
    /// Capacity of watch channels (default: 64)
    pub watch_buffer_len: usize,
    /// Query options applied to every request.
    pub query: Vec<QueryOption>,
    /// HTTP client override. Defaults to reqwest.
    pub http_client: Option<Arc<dyn HttpClient>>,
    /// Token source override. Takes precedence over `credentials`.
    pub token_source: Option<Arc<dyn TokenSource>>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            credentials: None,
            user_id: None,
            claims: None,
            watch_buffer_len: DEFAULT_WATCH_BUFFER_LEN,
            query: Vec::new(),
            http_client: None,
            token_source: None,
        }
    }
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_credentials(mut self, credentials: ServiceAccountCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Load service account credentials from a key file.
    pub fn with_credentials_file(self, path: impl AsRef<Path>) -> FirebaseResult<Self> {
        let credentials = ServiceAccountCredentials::from_file(path)?;
        Ok(self.with_credentials(credentials))
    }

    /// Authenticate as a specific user id instead of as an administrator.
    pub fn with_user_id(mut self, uid: impl Into<String>) -> Self {
        self.user_id = Some(uid.into());
        self
    }

    /// Extra claims visible to security rules as `auth.token`.
    pub fn with_claims(mut self, claims: Value) -> Self {
        self.claims = Some(claims);
        self
    }

    pub fn with_watch_buffer_len(mut self, len: usize) -> Self {
        self.watch_buffer_len = len;
        self
    }

    pub fn with_query_option(mut self, option: QueryOption) -> Self {
        self.query.push(option);
        self
    }

    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Create config from `FIREBASE_URL`, `FIREBASE_CREDENTIALS` and
    /// `FIREBASE_WATCH_BUFFER`. Unset variables keep their defaults.
    pub fn from_env() -> FirebaseResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> FirebaseResult<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_URL).filter(|v| !v.is_empty()) {
            config = config.with_url(url);
        }

        if let Some(path) = lookup(ENV_CREDENTIALS).filter(|v| !v.is_empty()) {
            config = config.with_credentials_file(path)?;
        }

        if let Some(len) = lookup(ENV_WATCH_BUFFER).filter(|v| !v.is_empty()) {
            let len = len.trim().parse().map_err(|_| {
                FirebaseError::Config(format!("{} must be a positive integer, got {:?}", ENV_WATCH_BUFFER, len))
            })?;
            config = config.with_watch_buffer_len(len);
        }

        Ok(config)
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url)
            .field("credentials", &self.credentials)
            .field("user_id", &self.user_id)
            .field("claims", &self.claims)
            .field("watch_buffer_len", &self.watch_buffer_len)
            .field("query", &self.query)
            .field("http_client", &self.http_client.is_some())
            .field("token_source", &self.token_source.is_some())
            .finish()
    }
}
