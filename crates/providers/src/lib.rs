//! LLM provider implementations and the completion gateway for Tactico.
//!
//! All providers implement the `tactico_core::Provider` trait. The router
//! selects the backend named in configuration; the gateway adds throttling,
//! timeouts and retries on top.

pub mod gateway;
pub mod ollama;
pub mod openai_compat;
pub mod retry;
pub mod router;
pub mod throttle;

pub use gateway::CompletionGateway;
pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use retry::RetryPolicy;
pub use router::{build_from_config, build_provider};
pub use throttle::{NoThrottle, Throttle, TokenBucket};
