//! Shared test doubles for the agent tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tactico_core::error::{ProviderError, ToolError};
use tactico_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use tactico_core::tool::{ParameterSchema, Tool, ToolOutput};
use tokio_util::sync::CancellationToken;

/// A mock provider that returns a sequence of scripted outcomes.
///
/// Each call to `complete` returns the next outcome in the queue.
/// Panics if more calls are made than outcomes provided.
pub struct SequentialMockProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    cancel_after_call: Option<CancellationToken>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            cancel_after_call: None,
        }
    }

    /// Create a provider that returns the given texts in order.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    /// Cancel `token` while the first call is in flight.
    pub fn cancel_after_call(mut self, token: CancellationToken) -> Self {
        self.cancel_after_call = Some(token);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        if let Some(token) = &self.cancel_after_call {
            token.cancel();
        }

        let next = self.responses.lock().unwrap().pop_front();
        let Some(outcome) = next else {
            panic!("SequentialMockProvider: no more responses (call #{call})");
        };
        outcome.map(|text| make_text_response(&text))
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: text.to_string(),
        model: "mock-model".into(),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
    }
}

/// A tool that never finishes within any reasonable timeout.
pub struct SlowTool;

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "slow_query"
    }

    fn description(&self) -> &str {
        "Sleeps for ten minutes"
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::empty()
    }

    async fn execute(&self, _arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(ToolOutput::new(json!([])))
    }
}
