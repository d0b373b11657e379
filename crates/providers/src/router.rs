//! Provider router: selects the LLM backend named in configuration and
//! wraps it in a [`CompletionGateway`].

use std::sync::Arc;
use std::time::Duration;

use tactico_config::{AppConfig, LlmConfig};
use tactico_core::error::ProviderError;
use tactico_core::provider::Provider;
use tracing::info;

use crate::gateway::CompletionGateway;
use crate::ollama::OllamaProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::retry::RetryPolicy;
use crate::throttle;

/// Build the provider for `config.provider`.
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider: Arc<dyn Provider> = match config.provider.as_str() {
        "ollama" => Arc::new(OllamaProvider::new(&config.base_url)),
        "openai" => Arc::new(OpenAiCompatProvider::new(
            "openai",
            &config.base_url,
            config.api_key.clone(),
        )),
        other => {
            return Err(ProviderError::NotConfigured(format!(
                "unknown provider kind '{other}'"
            )));
        }
    };
    Ok(provider)
}

/// Build the completion gateway described by the full configuration.
pub fn build_from_config(config: &AppConfig) -> Result<CompletionGateway, ProviderError> {
    let provider = build_provider(&config.llm)?;
    info!(
        provider = provider.name(),
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        "Language model configured"
    );

    Ok(CompletionGateway::new(provider, &config.llm.model)
        .with_throttle(throttle::from_config(&config.throttle))
        .with_timeout(Duration::from_secs(config.llm.timeout_secs))
        .with_retry(RetryPolicy::default().with_max_retries(config.llm.max_retries)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let gateway = build_from_config(&config).unwrap();
        assert_eq!(gateway.provider_name(), "ollama");
        assert_eq!(gateway.model(), "qwen3:1.7b");
    }

    #[test]
    fn openai_kind_selects_compat_provider() {
        let mut config = LlmConfig::default();
        config.provider = "openai".into();
        config.base_url = "https://api.openai.com/v1".into();
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut config = LlmConfig::default();
        config.provider = "carrier-pigeon".into();
        let err = build_provider(&config).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
