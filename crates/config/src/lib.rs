//! Configuration loading, validation, and management for Tactico.
//!
//! Loads configuration from `~/.tactico/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Provider kinds understood by the provider router.
pub const PROVIDER_KINDS: &[&str] = &["openai", "ollama"];

/// Slowest non-zero request rate accepted for the throttle.
pub const MIN_REQUESTS_PER_SECOND: f64 = 0.001;

/// The root configuration structure.
///
/// Maps directly to `~/.tactico/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language model backend
    #[serde(default)]
    pub llm: LlmConfig,

    /// Outbound request throttle for the language model
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Reasoning loop bounds
    #[serde(default)]
    pub agent: AgentConfig,

    /// Graph database holding the match events
    #[serde(default)]
    pub graph: GraphConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `openai` (any OpenAI-compatible endpoint) or `ollama`
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-attempt completion timeout
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Retries for transient completion failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "qwen3:1.7b".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_llm_timeout() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Sustained request rate; `0` disables throttling
    #[serde(default = "default_rps")]
    pub requests_per_second: f64,

    /// Requests allowed back-to-back before the rate applies
    #[serde(default = "default_burst")]
    pub burst: u32,
}

fn default_rps() -> f64 {
    1.0
}
fn default_burst() -> u32 {
    2
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rps(),
            burst: default_burst(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,

    /// Observations longer than this are truncated before entering a prompt
    #[serde(default = "default_max_observation_chars")]
    pub max_observation_chars: usize,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_tool_timeout() -> u64 {
    30
}
fn default_max_observation_chars() -> usize {
    2000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tool_timeout_secs: default_tool_timeout(),
            max_observation_chars: default_max_observation_chars(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// HTTP endpoint of the Neo4j server
    #[serde(default = "default_graph_uri")]
    pub uri: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_graph_user")]
    pub user: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default = "default_graph_timeout")]
    pub timeout_secs: u64,
}

fn default_graph_uri() -> String {
    "http://localhost:7474".into()
}
fn default_database() -> String {
    "neo4j".into()
}
fn default_graph_user() -> String {
    "neo4j".into()
}
fn default_graph_timeout() -> u64 {
    30
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: default_graph_uri(),
            database: default_database(),
            user: default_graph_user(),
            password: None,
            timeout_secs: default_graph_timeout(),
        }
    }
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("uri", &self.uri)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.tactico/config.toml),
    /// then apply environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment variable overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_lookup(path, |key| std::env::var(key).ok())
    }

    /// Validation runs once, after the overrides, so an override can correct
    /// a bad file value.
    fn load_with_lookup<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply overrides from environment-style variables.
    ///
    /// `lookup` is usually `std::env::var`; tests pass a map.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LLM_PROVIDER") {
            self.llm.provider = v.trim().to_ascii_lowercase();
        }
        if let Some(v) = lookup("LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = lookup("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("LLM_API_KEY").filter(|v| !v.is_empty()) {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = lookup("LLM_TIMEOUT") {
            self.llm.timeout_secs = parse_env("LLM_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("AGENT_MAX_ITERATIONS") {
            self.agent.max_iterations = parse_env("AGENT_MAX_ITERATIONS", &v)?;
        }
        if let Some(v) = lookup("TACTICO_THROTTLE_RPS") {
            self.throttle.requests_per_second = parse_env("TACTICO_THROTTLE_RPS", &v)?;
        }
        if let Some(v) = lookup("TACTICO_THROTTLE_BURST") {
            self.throttle.burst = parse_env("TACTICO_THROTTLE_BURST", &v)?;
        }
        if let Some(v) = lookup("NEO4J_HTTP_URI") {
            self.graph.uri = v;
        }
        if let Some(v) = lookup("NEO4J_DATABASE") {
            self.graph.database = v;
        }
        if let Some(v) = lookup("NEO4J_USER") {
            self.graph.user = v;
        }
        if let Some(v) = lookup("NEO4J_PASSWORD") {
            self.graph.password = Some(v);
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tactico")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !PROVIDER_KINDS.contains(&self.llm.provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "llm.provider must be one of {}, got '{}'",
                PROVIDER_KINDS.join(", "),
                self.llm.provider
            )));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.llm.timeout_secs == 0 || self.agent.tool_timeout_secs == 0 || self.graph.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("timeouts must be greater than zero".into()));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        let rps = self.throttle.requests_per_second;
        if !rps.is_finite() || rps < 0.0 {
            return Err(ConfigError::ValidationError(
                "throttle.requests_per_second must be >= 0".into(),
            ));
        }
        if rps > 0.0 && rps < MIN_REQUESTS_PER_SECOND {
            return Err(ConfigError::ValidationError(format!(
                "throttle.requests_per_second must be 0 (disabled) or at least {MIN_REQUESTS_PER_SECOND}"
            )));
        }

        if self.throttle.requests_per_second > 0.0 && self.throttle.burst == 0 {
            return Err(ConfigError::ValidationError(
                "throttle.burst must be >= 1 when throttling is enabled".into(),
            ));
        }

        if !(self.graph.uri.starts_with("http://") || self.graph.uri.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "graph.uri must be an http(s) URL, got '{}'",
                self.graph.uri
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{key} has an invalid value: '{value}'")))
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
