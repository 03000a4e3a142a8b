//! OAuth2 access tokens for a service account.
//!
//! Implements the JWT bearer grant: sign an assertion with the service
//! account's key, post it to the token endpoint, and use the returned access
//! token as a bearer token for database requests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::credentials::ServiceAccountCredentials;
use crate::error::AuthError;
use crate::traits::{Headers, HttpClient, Method, TokenSource};

/// Scopes requested for database access.
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/firebase.database",
];

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Token source backed by a service account key.
///
/// Access tokens are cached and shared by all clones of a database reference.
/// Concurrent callers wait on a single refresh.
pub struct ServiceAccountTokenSource {
    client_email: String,
    token_uri: String,
    key: EncodingKey,
    http: Arc<dyn HttpClient>,
    expiration: Duration,
    extra_claims: Map<String, Value>,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    /// Lifetime requested for each assertion, in seconds.
    pub const DEFAULT_EXPIRATION_SECS: i64 = 3600;

    pub fn new(
        credentials: &ServiceAccountCredentials,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            client_email: credentials.client_email.clone(),
            token_uri: credentials.token_uri.clone(),
            key: credentials.encoding_key()?,
            http,
            expiration: Duration::seconds(Self::DEFAULT_EXPIRATION_SECS),
            extra_claims: Map::new(),
            cached: Mutex::new(None),
        })
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    /// Add a private claim to every assertion, e.g. `uid` or `claims`.
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_claims.insert(name.into(), value.into());
        self
    }

    /// Sign the assertion sent to the token endpoint.
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let mut claims = self.extra_claims.clone();
        claims.insert("iss".to_string(), Value::from(self.client_email.as_str()));
        claims.insert("sub".to_string(), Value::from(self.client_email.as_str()));
        claims.insert("aud".to_string(), Value::from(self.token_uri.as_str()));
        claims.insert("scope".to_string(), Value::from(SCOPES.join(" ")));
        claims.insert("iat".to_string(), Value::from(now.timestamp()));
        claims.insert(
            "exp".to_string(),
            Value::from((now + self.expiration).timestamp()),
        );

        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.key,
        )?)
    }

    async fn exchange(&self) -> Result<CachedToken, AuthError> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;
        let body = format!(
            "grant_type={}&assertion={}",
            urlencoding::encode(GRANT_TYPE),
            urlencoding::encode(&assertion)
        );

        let mut headers = Headers::new();
        headers.insert(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );

        debug!(token_uri = %self.token_uri, "Requesting service account access token");
        let response = self
            .http
            .execute(Method::Post, &self.token_uri, Some(Bytes::from(body)), &headers)
            .await?;

        if !response.is_success() {
            return Err(AuthError::TokenExchange {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).trim().to_string(),
            });
        }

        let token: TokenResponse = response.json()?;
        let lifetime = token
            .expires_in
            .map(Duration::seconds)
            .unwrap_or(self.expiration);

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + lifetime,
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.exchange().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }
}

impl std::fmt::Debug for ServiceAccountTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountTokenSource")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("expiration", &self.expiration)
            .field("extra_claims", &self.extra_claims)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::{HttpError, Response};
    use jsonwebtoken::{DecodingKey, Validation};
    use serde_json::json;

    const KEY_PEM: &str = include_str!("../../tests/fixtures/service_account_key.pem");
    const PUB_PEM: &str = include_str!("../../tests/fixtures/service_account_pub.pem");
    const TOKEN_URI: &str = "https://oauth2.example.com/token";

    fn credentials() -> ServiceAccountCredentials {
        let json = json!({
            "project_id": "demo-project",
            "client_email": "robot@demo-project.iam.gserviceaccount.com",
            "private_key": KEY_PEM,
            "token_uri": TOKEN_URI,
        });
        ServiceAccountCredentials::from_json(&serde_json::to_vec(&json).unwrap()).unwrap()
    }

    fn decode(token: &str) -> Map<String, Value> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[TOKEN_URI]);
        let key = DecodingKey::from_rsa_pem(PUB_PEM.as_bytes()).unwrap();
        jsonwebtoken::decode::<Map<String, Value>>(token, &key, &validation)
            .unwrap()
            .claims
    }

    fn token_response(token: &str, expires_in: i64) -> MockResponse {
        let body = json!({"access_token": token, "expires_in": expires_in, "token_type": "Bearer"});
        MockResponse::Success(Response::new(200, Bytes::from(body.to_string())))
    }

    #[test]
    fn test_assertion_claims() {
        let http = Arc::new(MockHttpClient::new());
        let source = ServiceAccountTokenSource::new(&credentials(), http)
            .unwrap()
            .with_claim("uid", "alice")
            .with_claim("claims", json!({"admin": true}));

        let now = Utc::now();
        let claims = decode(&source.assertion(now).unwrap());

        assert_eq!(claims["iss"], "robot@demo-project.iam.gserviceaccount.com");
        assert_eq!(claims["sub"], "robot@demo-project.iam.gserviceaccount.com");
        assert_eq!(claims["aud"], TOKEN_URI);
        assert_eq!(claims["scope"], SCOPES.join(" "));
        assert_eq!(claims["iat"], now.timestamp());
        assert_eq!(claims["exp"], now.timestamp() + 3600);
        assert_eq!(claims["uid"], "alice");
        assert_eq!(claims["claims"], json!({"admin": true}));
    }

    #[tokio::test]
    async fn test_token_exchange_and_cache() {
        let http = Arc::new(MockHttpClient::new());
        http.set_response(TOKEN_URI, token_response("ya29.first", 3600));
        let source = ServiceAccountTokenSource::new(&credentials(), http.clone()).unwrap();

        assert_eq!(source.token().await.unwrap(), "ya29.first");
        assert_eq!(source.token().await.unwrap(), "ya29.first");
        assert_eq!(http.request_count(), 1);

        let request = &http.get_requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );

        let body = request.body_text().unwrap();
        let mut pairs = body.split('&').filter_map(|pair| pair.split_once('='));
        let (_, grant) = pairs.next().unwrap();
        let (_, assertion) = pairs.next().unwrap();
        assert_eq!(urlencoding::decode(grant).unwrap(), GRANT_TYPE);
        let claims = decode(&urlencoding::decode(assertion).unwrap());
        assert_eq!(claims["aud"], TOKEN_URI);
    }

    #[tokio::test]
    async fn test_nearly_expired_token_is_refreshed() {
        let http = Arc::new(MockHttpClient::new());
        http.enqueue(token_response("short-lived", 30));
        http.enqueue(token_response("fresh", 3600));
        let source = ServiceAccountTokenSource::new(&credentials(), http.clone()).unwrap();

        assert_eq!(source.token().await.unwrap(), "short-lived");
        assert_eq!(source.token().await.unwrap(), "fresh");
        assert_eq!(http.request_count(), 2);
    }

    #[tokio::test]
    async fn test_rejected_assertion() {
        let http = Arc::new(MockHttpClient::new());
        http.set_response(
            TOKEN_URI,
            MockResponse::Success(Response::new(
                400,
                Bytes::from(r#"{"error":"invalid_grant"}"#),
            )),
        );
        let source = ServiceAccountTokenSource::new(&credentials(), http).unwrap();

        match source.token().await {
            Err(AuthError::TokenExchange { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.contains("invalid_grant"));
            }
            other => panic!("Expected TokenExchange error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let http = Arc::new(MockHttpClient::new());
        http.set_default_response(MockResponse::Error(HttpError::ConnectionFailed(
            "refused".to_string(),
        )));
        let source = ServiceAccountTokenSource::new(&credentials(), http).unwrap();

        assert!(matches!(source.token().await, Err(AuthError::Http(_))));
    }
}
