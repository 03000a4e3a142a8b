//! Database references.
//!
//! A [`DatabaseRef`] names one location in the database tree and carries
//! everything needed to talk to it. Child references share the parent's
//! HTTP client and token source.

mod ops;
mod query;

pub use query::QueryOption;

use reqwest::Url;
use std::sync::Arc;

use crate::adapters::ReqwestHttpClient;
use crate::auth::ServiceAccountTokenSource;
use crate::config::DatabaseConfig;
use crate::error::{FirebaseError, FirebaseResult};
use crate::traits::{Headers, HttpClient, TokenSource};

/// Reference to a location in the database.
///
/// Cloning is cheap. References are immutable: [`DatabaseRef::child`] returns
/// a new reference rather than modifying this one.
///
/// # Example
///
/// ```ignore
/// use firebase_rtdb::config::DatabaseConfig;
/// use firebase_rtdb::database::DatabaseRef;
///
/// let db = DatabaseRef::new(DatabaseConfig::from_env()?)?;
/// let alice = db.child("users/alice");
/// alice.set(&serde_json::json!({"name": "Alice"}), &[]).await?;
/// ```
#[derive(Clone)]
pub struct DatabaseRef {
    url: Url,
    http: Arc<dyn HttpClient>,
    token_source: Option<Arc<dyn TokenSource>>,
    query: Vec<QueryOption>,
    watch_buffer_len: usize,
}

impl DatabaseRef {
    /// Build the root reference described by `config`.
    pub fn new(config: DatabaseConfig) -> FirebaseResult<Self> {
        if config.watch_buffer_len == 0 {
            return Err(FirebaseError::Config(
                "watch buffer length must be positive".to_string(),
            ));
        }

        let raw_url = match (&config.url, &config.credentials) {
            (Some(url), _) => url.clone(),
            (None, Some(credentials)) => credentials.database_url(),
            (None, None) => {
                return Err(FirebaseError::Config(
                    "no database url specified".to_string(),
                ))
            }
        };
        let url = Url::parse(&raw_url)
            .map_err(|e| FirebaseError::InvalidUrl(format!("{}: {}", raw_url, e)))?;

        let http: Arc<dyn HttpClient> = match config.http_client {
            Some(client) => client,
            None => Arc::new(ReqwestHttpClient::new()),
        };

        let token_source = match (config.token_source, config.credentials) {
            (Some(source), _) => Some(source),
            (None, Some(credentials)) => {
                let mut source = ServiceAccountTokenSource::new(&credentials, http.clone())?;
                if let Some(uid) = config.user_id {
                    source = source.with_claim("uid", uid);
                }
                if let Some(claims) = config.claims {
                    source = source.with_claim("claims", claims);
                }
                Some(Arc::new(source) as Arc<dyn TokenSource>)
            }
            (None, None) => None,
        };

        Ok(Self {
            url,
            http,
            token_source,
            query: config.query,
            watch_buffer_len: config.watch_buffer_len,
        })
    }

    /// Reference to `path` below this location.
    ///
    /// Leading and trailing slashes are ignored, so `child("/a/")` and
    /// `child("a")` name the same place.
    pub fn child(&self, path: &str) -> DatabaseRef {
        let path = path.trim_matches('/');
        let mut child = self.clone();
        if path.is_empty() {
            return child;
        }

        let base = self.url.path().trim_end_matches('/');
        child.url.set_path(&format!("{}/{}", base, path));
        child
    }

    /// Last segment of the path, or `None` at the root.
    pub fn key(&self) -> Option<&str> {
        self.url
            .path()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
    }

    /// URL of this location, without the `.json` suffix.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Capacity of channels returned by [`watch`](crate::realtime::watch).
    pub fn watch_buffer_len(&self) -> usize {
        self.watch_buffer_len
    }

    pub(crate) fn http(&self) -> &Arc<dyn HttpClient> {
        &self.http
    }

    /// REST URL for a request with the given extra options.
    pub fn request_url(&self, options: &[QueryOption]) -> String {
        let mut url = self.url.clone();
        let path = format!("{}.json", self.url.path().trim_end_matches('/')).replace('+', "%2B");
        url.set_path(&path);

        if !self.query.is_empty() || !options.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for option in self.query.iter().chain(options) {
                let (name, value) = option.pair();
                pairs.append_pair(name, &value);
            }
        }

        url.into()
    }

    /// Headers for a request, including the bearer token if configured.
    pub(crate) async fn headers(&self) -> FirebaseResult<Headers> {
        let mut headers = Headers::new();
        if let Some(source) = &self.token_source {
            let token = source.token().await?;
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        Ok(headers)
    }
}

impl std::fmt::Debug for DatabaseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseRef")
            .field("url", &self.url.as_str())
            .field("query", &self.query)
            .field("authenticated", &self.token_source.is_some())
            .field("watch_buffer_len", &self.watch_buffer_len)
            .finish()
    }
}
