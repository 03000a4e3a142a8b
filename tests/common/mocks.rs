//! Mock implementations for test fixtures.
//!
//! This module re-exports the mock implementations from
//! `firebase_rtdb::adapters::mock` and adds stream scripting helpers.

pub use firebase_rtdb::adapters::mock::{MockHttpClient, MockResponse, RecordedRequest};
pub use firebase_rtdb::traits::{HttpError, Response};

use bytes::Bytes;
use std::sync::Arc;

/// Scripts the sequence of streams served to successive watch requests.
pub struct StreamScript {
    client: Arc<MockHttpClient>,
}

impl StreamScript {
    /// Starts a script. Requests beyond the scripted ones get an open,
    /// silent stream.
    pub fn new() -> Self {
        let client = Arc::new(MockHttpClient::new());
        client.set_default_response(MockResponse::OpenStream(Vec::new()));
        Self { client }
    }

    /// A stream that delivers `frames` and then ends.
    pub fn then_closes(self, frames: Vec<Bytes>) -> Self {
        self.client.enqueue(MockResponse::Stream(frames));
        self
    }

    /// A stream that delivers `frames` and then stays open.
    pub fn then_stays_open(self, frames: Vec<Bytes>) -> Self {
        self.client.enqueue(MockResponse::OpenStream(frames));
        self
    }

    /// A connection attempt that fails outright.
    pub fn then_fails(self, err: HttpError) -> Self {
        self.client.enqueue(MockResponse::Error(err));
        self
    }

    /// A connection attempt rejected by the server.
    pub fn then_rejects(self, status: u16, body: &str) -> Self {
        self.client.enqueue(MockResponse::Success(Response::new(
            status,
            Bytes::from(body.to_string()),
        )));
        self
    }

    pub fn build(self) -> Arc<MockHttpClient> {
        self.client
    }
}

impl Default for StreamScript {
    fn default() -> Self {
        Self::new()
    }
}
