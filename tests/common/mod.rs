//! Common test utilities for integration tests.
//!
//! This module provides reusable fixtures: database references backed by
//! the mock HTTP client, SSE frame builders, and service account keys.
#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use bytes::Bytes;
use firebase_rtdb::sse::Event;
use firebase_rtdb::{DatabaseConfig, DatabaseRef};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Base URL used with the mock HTTP client.
pub const TEST_URL: &str = "https://test-project.firebaseio.com/";

/// How long tests wait for a channel before failing.
pub const WAIT: Duration = Duration::from_secs(5);

/// PEM-encoded RSA key used to sign test assertions.
pub const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/service_account_key.pem");

/// Public half of [`TEST_PRIVATE_KEY`].
pub const TEST_PUBLIC_KEY: &str = include_str!("../fixtures/service_account_pub.pem");

/// Creates a root reference that talks to `http`.
pub fn mock_db(http: Arc<MockHttpClient>) -> DatabaseRef {
    DatabaseRef::new(
        DatabaseConfig::new()
            .with_url(TEST_URL)
            .with_http_client(http),
    )
    .unwrap()
}

/// Encodes one SSE frame.
pub fn frame(event_type: &str, data: &str) -> Bytes {
    Bytes::from(format!("event: {}\ndata: {}\n\n", event_type, data))
}

/// Service account key JSON whose token endpoint is `token_uri`.
pub fn service_account_json(token_uri: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "type": "service_account",
        "project_id": "test-project",
        "private_key_id": "0123456789abcdef",
        "private_key": TEST_PRIVATE_KEY,
        "client_email": "tester@test-project.iam.gserviceaccount.com",
        "token_uri": token_uri,
    }))
    .unwrap()
}

/// Receives the next event, failing the test if none arrives in time.
pub async fn recv(rx: &mut mpsc::Receiver<Event>) -> Option<Event> {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for channel")
}
