//! Mock transport for testing purposes.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::sources::{SourceError, Transport};

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Vec<u8>>,
}

impl RecordedCall {
    /// Body parsed as JSON, if there was one
    pub fn json(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_slice(b).ok())
    }
}

type Reply = Result<Vec<u8>, SourceError>;

#[derive(Debug, Default)]
struct Script {
    // Replies consumed in order; the last one repeats once the queue is down
    // to a single entry.
    replies: HashMap<(&'static str, String), VecDeque<Reply>>,
    calls: Vec<RecordedCall>,
}

/// A transport that returns scripted replies per method and path.
///
/// Unscripted paths answer with [`SourceError::Transport`].
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<Script>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, method: &'static str, path: &str, reply: Reply) {
        self.script()
            .replies
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Queue a POST response body for `path`.
    pub fn on_post(&self, path: &str, body: impl Into<Vec<u8>>) -> &Self {
        self.push("POST", path, Ok(body.into()));
        self
    }

    /// Queue a POST failure for `path`.
    pub fn on_post_error(&self, path: &str, error: SourceError) -> &Self {
        self.push("POST", path, Err(error));
        self
    }

    /// Queue a GET response body for `path`.
    pub fn on_get(&self, path: &str, body: impl Into<Vec<u8>>) -> &Self {
        self.push("GET", path, Ok(body.into()));
        self
    }

    /// Queue a GET failure for `path`.
    pub fn on_get_error(&self, path: &str, error: SourceError) -> &Self {
        self.push("GET", path, Err(error));
        self
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script().calls.clone()
    }

    /// Calls made to `path`.
    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.script()
            .calls
            .iter()
            .filter(|c| c.path == path)
            .cloned()
            .collect()
    }

    fn reply(&self, method: &'static str, path: &str, body: Option<Vec<u8>>) -> Reply {
        let mut script = self.script();
        script.calls.push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });

        let Some(queue) = script.replies.get_mut(&(method, path.to_string())) else {
            return Err(SourceError::Transport(format!(
                "no mock reply for {} {}",
                method, path
            )));
        };
        if queue.len() > 1 {
            return queue
                .pop_front()
                .unwrap_or_else(|| Err(SourceError::Transport("empty mock queue".to_string())));
        }
        match queue.front() {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(err)) => Err(clone_error(err)),
            None => Err(SourceError::Transport("empty mock queue".to_string())),
        }
    }
}

fn clone_error(err: &SourceError) -> SourceError {
    match err {
        SourceError::Transport(m) => SourceError::Transport(m.clone()),
        SourceError::Decode(m) => SourceError::Decode(m.clone()),
        SourceError::NoContent => SourceError::NoContent,
        SourceError::Service { code, message } => SourceError::Service {
            code: code.clone(),
            message: message.clone(),
        },
        SourceError::InvalidRequest(m) => SourceError::InvalidRequest(m.clone()),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(
        &self,
        path: &str,
        body: Vec<u8>,
        _timeout: Duration,
    ) -> Result<Vec<u8>, SourceError> {
        self.reply("POST", path, Some(body))
    }

    async fn get(&self, path: &str, _timeout: Duration) -> Result<Vec<u8>, SourceError> {
        self.reply("GET", path, None)
    }
}
