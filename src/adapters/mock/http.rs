//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that can return predefined
//! responses, errors, or server-sent event streams.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, Method, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: Method,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body, if any
    pub body: Option<Bytes>,
}

impl RecordedRequest {
    /// Request body decoded as UTF-8.
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a buffered response
    Success(Response),
    /// Fail the request
    Error(HttpError),
    /// Return a stream of bytes that ends after the last chunk
    Stream(Vec<Bytes>),
    /// Return a stream that yields the chunks, then fails with the error
    BrokenStream(Vec<Bytes>, HttpError),
    /// Return a stream that yields the chunks, then never ends
    OpenStream(Vec<Bytes>),
}

/// Mock HTTP client for testing.
///
/// Responses are chosen in this order: the next queued response (see
/// [`MockHttpClient::enqueue`]), an exact or prefix URL match, then the
/// default response.
///
/// # Example
///
/// ```ignore
/// use firebase_rtdb::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.enqueue(MockResponse::Stream(vec![Bytes::from("event: put\ndata: {}\n\n")]));
/// client.set_default_response(MockResponse::OpenStream(vec![]));
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Responses handed out once each, in order
    queue: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            default_response: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set a response for a specific URL (exact or prefix match).
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Queue a response to be returned once, ahead of URL matches.
    pub fn enqueue(&self, response: MockResponse) {
        self.queue.lock().unwrap().push_back(response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests made so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record_request(&self, method: Method, url: &str, headers: &Headers, body: Option<Bytes>) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method,
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        if let Some(queued) = self.queue.lock().unwrap().pop_front() {
            return Some(queued);
        }

        let responses = self.responses.lock().unwrap();

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern) {
                return Some(response.clone());
            }
        }

        let default = self.default_response.lock().unwrap();
        default.clone()
    }

    fn chunks(chunks: Vec<Bytes>) -> impl futures::Stream<Item = Result<Bytes, HttpError>> {
        futures::stream::iter(chunks.into_iter().map(Ok))
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<Bytes>,
        headers: &Headers,
    ) -> Result<Response, HttpError> {
        self.record_request(method, url, headers, body);

        match self.get_response(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(_) => Err(HttpError::Other(
                "Stream response on non-stream request".to_string(),
            )),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }

    async fn get_stream(&self, url: &str, headers: &Headers) -> Result<ByteStream, HttpError> {
        self.record_request(Method::Get, url, headers, None);

        match self.get_response(url) {
            Some(MockResponse::Stream(chunks)) => Ok(Box::pin(Self::chunks(chunks))),
            Some(MockResponse::BrokenStream(chunks, err)) => {
                let tail = futures::stream::once(async move { Err(err) });
                Ok(Box::pin(Self::chunks(chunks).chain(tail)))
            }
            Some(MockResponse::OpenStream(chunks)) => {
                Ok(Box::pin(Self::chunks(chunks).chain(futures::stream::pending())))
            }
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Success(response)) if !response.is_success() => {
                Err(HttpError::ServerError {
                    status: response.status,
                    message: String::from_utf8_lossy(&response.body).into_owned(),
                })
            }
            Some(MockResponse::Success(_)) => Err(HttpError::Other(
                "Non-stream response on stream request".to_string(),
            )),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}
