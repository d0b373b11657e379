//! Native Ollama provider (`/api/chat`).
//!
//! The health check queries `/api/tags` and confirms the configured model
//! has been pulled.

use async_trait::async_trait;
use serde::Deserialize;
use tactico_core::error::ProviderError;
use tactico_core::provider::*;
use tracing::debug;

use crate::retry::{http_client, response_to_error, transport_error};

pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http_client(),
        }
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| serde_json::json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        let mut options = serde_json::json!({ "temperature": request.temperature });
        if let Some(max_tokens) = request.max_tokens {
            options["num_predict"] = serde_json::json!(max_tokens);
        }
        if !request.stop.is_empty() {
            options["stop"] = serde_json::json!(request.stop);
        }

        serde_json::json!({
            "model": request.model,
            "messages": messages,
            "stream": false,
            "options": options,
        })
    }
}

fn parse_response(body: &str) -> Result<ProviderResponse, ProviderError> {
    let chat: ChatResponse = serde_json::from_str(body).map_err(|e| ProviderError::ApiError {
        status_code: 200,
        message: format!("Failed to parse response: {e}"),
    })?;

    let usage = match (chat.prompt_eval_count, chat.eval_count) {
        (Some(prompt), Some(completion)) => Some(Usage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        }),
        _ => None,
    };

    Ok(ProviderResponse {
        content: chat.message.content,
        model: chat.model,
        usage,
    })
}

/// Whether `/api/tags` lists `model`; a bare name matches any tag of it.
fn tags_contain(body: &TagsResponse, model: &str) -> bool {
    body.models.iter().any(|m| {
        m.name == model
            || m.name
                .strip_prefix(model)
                .is_some_and(|rest| rest.starts_with(':'))
    })
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(model = %request.model, "Sending Ollama chat request");

        let response = self
            .client
            .post(&url)
            .json(&Self::request_body(&request))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(response_to_error(response, &request.model).await);
        }

        let text = response.text().await.map_err(transport_error)?;
        parse_response(&text)
    }

    async fn health_check(&self, model: &str) -> Result<bool, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let tags: TagsResponse = response.json().await.map_err(transport_error)?;
        Ok(tags_contain(&tags, model))
    }
}

// --- Ollama API types (internal) ---

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    message: ChatMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}
