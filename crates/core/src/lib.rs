//! # Tactico Core
//!
//! Domain types, traits, and error definitions for the Tactico match
//! analysis agent. This crate has **no transport dependencies**; it defines
//! the seams that the other crates implement against.
//!
//! ## Seams
//!
//! - [`Provider`]: a text-completion backend (OpenAI-compatible, Ollama)
//! - [`Tool`] / [`ToolRegistry`]: schema-typed match queries the agent can call
//! - [`GraphClient`]: the graph database holding the match events
//!
//! Every seam is a trait so tests can substitute scripted implementations.

pub mod error;
pub mod graph;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{CompletionError, Error, GraphError, ProviderError, Result, RunError, ToolError};
pub use graph::{GraphClient, Row};
pub use message::{Message, Role};
pub use provider::{GenerationOptions, Prompt, Provider, ProviderRequest, ProviderResponse};
pub use tool::{
    ParamKind, ParamSpec, ParameterSchema, Tool, ToolDescriptor, ToolOutput, ToolRegistry,
    normalize_tool_name,
};
