//! Completion gateway: the single path from the agent to a language model.
//!
//! Every call is throttled, bounded by a per-attempt timeout, and retried a
//! bounded number of times on transient failures. Callers see either the
//! generated text or a typed [`CompletionError`].

use std::sync::Arc;
use std::time::Duration;

use tactico_core::error::{CompletionError, ProviderError};
use tactico_core::provider::{GenerationOptions, Prompt, Provider, ProviderRequest};
use tracing::{debug, warn};

use crate::retry::RetryPolicy;
use crate::throttle::{NoThrottle, Throttle};

pub struct CompletionGateway {
    provider: Arc<dyn Provider>,
    throttle: Arc<dyn Throttle>,
    model: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl CompletionGateway {
    /// Create a gateway with no throttle, a 120s timeout and the default retry policy.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            throttle: Arc::new(NoThrottle),
            model: model.into(),
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_throttle(mut self, throttle: Arc<dyn Throttle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Whether the backend is reachable and serves the configured model.
    pub async fn health_check(&self) -> Result<bool, ProviderError> {
        self.provider.health_check(&self.model).await
    }

    /// Send `prompt` and return the generated text.
    pub async fn complete(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<String, CompletionError> {
        let mut attempt = 0u32;
        loop {
            self.throttle.acquire().await;

            let request = ProviderRequest::new(&self.model, prompt, options);
            let failure = match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
                Ok(Ok(response)) => {
                    debug!(
                        provider = self.provider.name(),
                        model = %response.model,
                        chars = response.content.len(),
                        "Completion received"
                    );
                    return Ok(response.content);
                }
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                )),
            };

            if !failure.is_transient() || attempt >= self.retry.max_retries {
                warn!(
                    provider = self.provider.name(),
                    attempts = attempt + 1,
                    error = %failure,
                    "Completion failed"
                );
                return Err(self.completion_error(failure));
            }

            attempt += 1;
            let retry_after = match &failure {
                ProviderError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
                _ => None,
            };
            let delay = self.retry.delay_for(attempt, retry_after);
            warn!(
                provider = self.provider.name(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Transient completion failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn completion_error(&self, err: ProviderError) -> CompletionError {
        match err {
            ProviderError::Timeout(_) => CompletionError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            },
            other => other.into(),
        }
    }
}
