//! Error types for the Tactico domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] unifies them.

use thiserror::Error;

/// The top-level error type for all Tactico operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Run error: {0}")]
    Run(#[from] RunError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Transport-level failures reported by a [`crate::Provider`].
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::ModelNotFound(_) | Self::NotConfigured(_) => {
                false
            }
        }
    }
}

/// Typed failure of the completion gateway, after throttling and retries.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("completion timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("completion rate limited (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("upstream completion error: {0}")]
    Upstream(String),
}

impl From<ProviderError> for CompletionError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            ProviderError::Timeout(_) => Self::Timeout { timeout_secs: 0 },
            other => Self::Upstream(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Missing required parameter '{parameter}' for {tool_name}")]
    MissingParameter { tool_name: String, parameter: String },

    #[error("Parameter '{parameter}' of {tool_name} expects {expected}, got {found}")]
    TypeMismatch {
        tool_name: String,
        parameter: String,
        expected: String,
        found: String,
    },

    #[error("Unexpected parameter '{parameter}' for {tool_name}")]
    UnexpectedParameter { tool_name: String, parameter: String },

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

impl ToolError {
    /// Stable snake_case label used when the error is recorded as an observation.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "unknown_tool",
            Self::MissingParameter { .. } => "missing_parameter",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::UnexpectedParameter { .. } => "unexpected_parameter",
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::Timeout { .. } => "timeout",
            Self::InvalidArguments(_) => "malformed_arguments",
        }
    }

    /// Whether the error was raised before the tool ran (schema validation).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::MissingParameter { .. }
                | Self::TypeMismatch { .. }
                | Self::UnexpectedParameter { .. }
                | Self::InvalidArguments(_)
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum GraphError {
    #[error("Graph connection failed: {0}")]
    Connection(String),

    #[error("Graph authentication failed")]
    Authentication,

    #[error("Graph query failed: {code}: {message}")]
    Query { code: String, message: String },

    #[error("Malformed graph response: {0}")]
    Decode(String),
}

/// Fatal outcomes of a reasoning run.
#[derive(Debug, Clone, Error)]
pub enum RunError {
    #[error("language model unavailable: {0}")]
    Completion(#[from] CompletionError),

    #[error("run cancelled")]
    Cancelled,

    #[error("question is empty")]
    EmptyQuestion,
}
