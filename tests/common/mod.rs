//! Shared test doubles for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use storyfetch::adapters::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Scripted outcome of one request
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with status and JSON body
    Json(u16, String),
    /// Fail at the transport level
    Fail(TransportError),
    /// Never answer within any reasonable timeout
    Hang,
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Reply::Json(200, body.to_string())
    }

    pub fn status(status: u16) -> Self {
        Reply::Json(status, String::new())
    }

    pub fn network(cause: &str) -> Self {
        Reply::Fail(TransportError::Other(cause.to_string()))
    }
}

/// A recorded request
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub body: Option<Vec<u8>>,
    pub at: tokio::time::Instant,
}

/// Transport with per-URL reply queues. The last reply of a queue repeats.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `reply` for `url`
    pub fn route(self, url: &str, reply: Reply) -> Self {
        self.push(url, reply);
        self
    }

    /// Queue `reply` for `url` on a shared transport
    pub fn push(&self, url: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Replace every queued reply for `url`
    pub fn set(&self, url: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.entry(url.to_string()).or_default();
        queue.clear();
        queue.push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.url == url).count()
    }

    /// Gaps between consecutive calls
    pub fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls();
        calls.windows(2).map(|w| w[1].at - w[0].at).collect()
    }

    fn next_reply(&self, url: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Reply::status(404),
        }
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    fn name(&self) -> &str {
        "stub"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(Call {
            url: request.url.clone(),
            body: request.body.clone(),
            at: tokio::time::Instant::now(),
        });

        match self.next_reply(&request.url) {
            Reply::Json(status, body) => Ok(HttpResponse::new(status, body.into_bytes())),
            Reply::Fail(err) => Err(err),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(TransportError::Other("stub hang elapsed".to_string()))
            }
        }
    }
}

pub const EXTRACT_URL: &str = "https://api.test/extract";
pub const FLAGS_URL: &str = "https://config.test/flags.json";
pub const SUBSCRIPTION_URL: &str = "https://config.test/subscription.json";

pub const MEDIA_JSON: &str = r#"{
    "allVideoVersions": [
        {"url": "https://cdn.test/480.mp4", "width": 480, "height": 854, "type": 101},
        {"url": "https://cdn.test/1080.mp4", "width": 1080, "height": 1920, "type": 102}
    ],
    "downloadLink": "https://cdn.test/480.mp4",
    "thumbnailUrl": "https://cdn.test/thumb.jpg",
    "videoTitle": "Highlight",
    "videoQuality": {"width": 1080, "height": 1920}
}"#;
