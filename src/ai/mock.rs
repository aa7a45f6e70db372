//! Offline stand-in for the model service, used by tests and smoke runs.

use super::client::{GenerationRequest, GenerationResult, ModelService};
use crate::error::GenerationError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedService {
    script: Mutex<VecDeque<Result<GenerationResult, GenerationError>>>,
    seen: Mutex<Vec<GenerationRequest>>,
    delay: Option<Duration>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, response: GenerationResult) {
        self.push_result(Ok(response));
    }

    pub fn push_text(&self, text: &str) {
        self.push(GenerationResult::text(text));
    }

    pub fn push_json(&self, value: Value) {
        self.push(GenerationResult::structured(value));
    }

    pub fn push_error(&self, error: GenerationError) {
        self.push_result(Err(error));
    }

    fn push_result(&self, entry: Result<GenerationResult, GenerationError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ModelService for ScriptedService {
    async fn invoke(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        next.unwrap_or_else(|| Err(GenerationError::network("script exhausted")))
    }
}
