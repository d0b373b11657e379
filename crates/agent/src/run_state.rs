//! Per-question run state.
//!
//! One [`RunState`] lives for the duration of a single analysis and records
//! everything the loop saw and decided. It is serializable so a finished run
//! can be exported as a trace.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tactico_core::error::ToolError;

/// One proposed tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Canonical tool name, or whatever the model proposed when the call
    /// could not be resolved (possibly empty)
    pub name: String,

    pub arguments: Map<String, Value>,

    /// False when parsing or validation failed and nothing was executed
    pub dispatched: bool,
}

/// Why an ACT step produced no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoActionFound,
    MalformedArguments,
    UnknownTool,
    MissingParameter,
    TypeMismatch,
    UnexpectedParameter,
    ExecutionFailed,
    Timeout,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NoActionFound => "no_action_found",
            FailureKind::MalformedArguments => "malformed_arguments",
            FailureKind::UnknownTool => "unknown_tool",
            FailureKind::MissingParameter => "missing_parameter",
            FailureKind::TypeMismatch => "type_mismatch",
            FailureKind::UnexpectedParameter => "unexpected_parameter",
            FailureKind::ExecutionFailed => "execution_failed",
            FailureKind::Timeout => "timeout",
        }
    }
}

impl From<&ToolError> for FailureKind {
    fn from(err: &ToolError) -> Self {
        match err {
            ToolError::NotFound(_) => FailureKind::UnknownTool,
            ToolError::MissingParameter { .. } => FailureKind::MissingParameter,
            ToolError::TypeMismatch { .. } => FailureKind::TypeMismatch,
            ToolError::UnexpectedParameter { .. } => FailureKind::UnexpectedParameter,
            ToolError::InvalidArguments(_) => FailureKind::MalformedArguments,
            ToolError::ExecutionFailed { .. } => FailureKind::ExecutionFailed,
            ToolError::Timeout { .. } => FailureKind::Timeout,
        }
    }
}

/// The structured result of one ACT step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Observation {
    Success { data: Value },
    Failure { kind: FailureKind, message: String },
}

impl Observation {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Observation::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Observation::Success { .. })
    }
}

impl From<&ToolError> for Observation {
    fn from(err: &ToolError) -> Self {
        Observation::failure(FailureKind::from(err), err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Continue,
    Complete,
}

/// The outcome of one REFLECT step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reflection {
    pub decision: Decision,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,

    /// False when the model's output was ambiguous and the decision defaulted
    pub explicit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Grade an answer by the evidence behind it.
    pub fn assess(state: &RunState, completed_by_reflection: bool) -> Self {
        match state.successful_observations() {
            0 => Confidence::Low,
            _ if completed_by_reflection => Confidence::High,
            _ => Confidence::Medium,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// A final answer appeared directly in a thought
    EarlyStop,
    /// A reflection judged the evidence sufficient
    Completed,
    /// The iteration limit was reached
    ForcedFinalization,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    question: String,
    pub thoughts: Vec<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub tool_results: Vec<Observation>,
    pub reflections: Vec<Reflection>,
    pub iteration_count: u32,
    pub parse_failures: u32,
    final_answer: Option<String>,
    pub confidence: Option<Confidence>,
    pub termination: Option<Termination>,
}

impl RunState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            question: question.into(),
            thoughts: Vec::new(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            reflections: Vec::new(),
            iteration_count: 0,
            parse_failures: 0,
            final_answer: None,
            confidence: None,
            termination: None,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    /// Set the final answer. Returns false, leaving the first answer in
    /// place, if one was already set.
    pub fn set_final_answer(&mut self, answer: impl Into<String>) -> bool {
        if self.final_answer.is_some() {
            return false;
        }
        self.final_answer = Some(answer.into());
        true
    }

    /// Append a call and its observation together so the two lists stay aligned.
    pub fn record(&mut self, call: ToolCallRecord, observation: Observation) {
        self.tool_calls.push(call);
        self.tool_results.push(observation);
    }

    pub fn successful_observations(&self) -> usize {
        self.tool_results.iter().filter(|o| o.is_success()).count()
    }
}
