//! In-memory provider for tests: canned responses queued per request kind.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::Provider;
use crate::errors::BrewError;
use crate::wire::{GenerationRequest, RequestKind};

#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<HashMap<RequestKind, VecDeque<Result<Value, BrewError>>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every call sleeps for `delay` (tokio time) before answering.
    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay, ..Self::default() })
    }

    pub fn push_ok(&self, kind: RequestKind, value: Value) {
        self.responses.lock().entry(kind).or_default().push_back(Ok(value));
    }

    pub fn push_err(&self, kind: RequestKind, err: BrewError) {
        self.responses.lock().entry(kind).or_default().push_back(Err(err));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_of(&self, kind: RequestKind) -> usize {
        self.requests.lock().iter().filter(|r| r.kind == kind).count()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn generate(&self, req: &GenerationRequest) -> Result<Value, BrewError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(req.clone());
        let next = self.responses.lock().get_mut(&req.kind).and_then(|q| q.pop_front());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        next.unwrap_or_else(|| Err(BrewError::Transport(format!("no scripted {} response", req.kind))))
    }
}
