//! In-memory fakes for the transport and sleeper seams (testing only)

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::{ApiError, HttpResponse, Sleeper, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    NetworkError(String),
}

/// Scripted transport: each URL serves its queued replies in order.
///
/// Once a URL's queue is empty it answers 404.
#[derive(Debug, Default)]
pub struct FakeTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, url: &str, reply: Reply) {
        let mut replies = self.replies.lock().unwrap();
        replies.entry(url.to_string()).or_default().push_back(reply);
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.push(url, Reply::Response(HttpResponse::new(status, body)));
    }

    pub fn respond_json(&self, url: &str, body: &serde_json::Value) {
        self.respond(url, 200, &body.to_string());
    }

    pub fn fail_network(&self, url: &str, message: &str) {
        self.push(url, Reply::NetworkError(message.to_string()));
    }

    /// Every URL requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(url.to_string());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::NetworkError(message)) => Err(ApiError::Network(message)),
            None => Ok(HttpResponse::new(404, "")),
        }
    }
}

/// Sleeper that records requested delays and returns immediately
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}
