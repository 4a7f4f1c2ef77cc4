/*!
 * Scripted transport for testing.
 *
 * This module provides a transport that answers step requests from per-document
 * scripts instead of the network:
 * - Unscripted documents succeed with zero content chunks
 * - `script_chunks` succeeds for a given chunk count
 * - `script` replays an explicit list of replies, including transport failures
 *
 * Every request is recorded so tests can assert on ordering and concurrency.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::TransportError;

use super::steps::Step;
use super::{StepRequest, StepResponse, StepTransport};

/// One scripted answer to a step request
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Answer with this body
    Respond(StepResponse),
    /// Answer `success: true`, filling in a fresh job for `init`
    Succeed,
    /// Behave as if the connection dropped
    ConnectionLost,
    /// Behave as if the body could not be parsed
    Malformed,
}

type RequestHook = Arc<dyn Fn(&StepRequest) + Send + Sync>;

/// Transport answering from scripts, recording every request
pub struct MockTransport {
    scripts: Mutex<HashMap<(u64, String), VecDeque<ScriptedReply>>>,
    requests: Mutex<Vec<StepRequest>>,
    next_job_id: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Option<Duration>,
    hook: Mutex<Option<RequestHook>>,
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("requests", &self.requests.lock().len())
            .field("latency", &self.latency)
            .finish()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a transport where every unscripted document succeeds
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            next_job_id: AtomicU64::new(100),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            latency: None,
            hook: Mutex::new(None),
        }
    }

    /// Delay every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replace the script for one document/language pair
    pub fn script(&self, source_id: u64, language: &str, replies: Vec<ScriptedReply>) {
        self.scripts
            .lock()
            .insert((source_id, language.to_string()), replies.into());
    }

    /// Script a fully successful job with `chunk_count` content chunks
    pub fn script_chunks(&self, source_id: u64, language: &str, chunk_count: usize) {
        let job_id = self.next_job_id.fetch_add(1, Ordering::SeqCst);
        let mut replies = vec![ScriptedReply::Respond(StepResponse::init(job_id, chunk_count))];
        replies.extend((0..chunk_count + 3).map(|_| ScriptedReply::Succeed));
        self.script(source_id, language, replies);
    }

    /// Run `hook` synchronously whenever a request arrives, before it is answered
    pub fn on_request(&self, hook: impl Fn(&StepRequest) + Send + Sync + 'static) {
        *self.hook.lock() = Some(Arc::new(hook));
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<StepRequest> {
        self.requests.lock().clone()
    }

    /// Requests received for one document
    pub fn requests_for(&self, source_id: u64) -> Vec<StepRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.source_post_id == source_id)
            .cloned()
            .collect()
    }

    /// Highest number of requests that were ever outstanding at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, request: &StepRequest) -> ScriptedReply {
        let key = (request.source_post_id, request.target_language.clone());
        self.scripts
            .lock()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or(ScriptedReply::Succeed)
    }

    fn succeed(&self, request: &StepRequest) -> StepResponse {
        if request.step == Step::Init {
            StepResponse::init(self.next_job_id.fetch_add(1, Ordering::SeqCst), 0)
        } else {
            StepResponse::ok()
        }
    }
}

#[async_trait]
impl StepTransport for MockTransport {
    async fn send_step(&self, request: &StepRequest) -> Result<StepResponse, TransportError> {
        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(outstanding, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let hook = self.hook.lock().clone();
        if let Some(hook) = hook {
            hook(request);
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let reply = self.next_reply(request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            ScriptedReply::Respond(response) => Ok(response),
            ScriptedReply::Succeed => Ok(self.succeed(request)),
            ScriptedReply::ConnectionLost => Err(TransportError::Connection(
                "connection reset by peer".to_string(),
            )),
            ScriptedReply::Malformed => Err(TransportError::Malformed(
                "expected value at line 1 column 1".to_string(),
            )),
        }
    }
}
