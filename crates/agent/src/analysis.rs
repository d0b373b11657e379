//! Trace steps and the result returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::run_state::{Confidence, RunState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Thought,
    Action,
    Reflection,
}

/// One entry in the reasoning trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    pub phase: StepKind,
    pub iteration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TraceStep {
    pub fn thought(iteration: u32, content: &str) -> Self {
        Self {
            phase: StepKind::Thought,
            iteration,
            tool: None,
            arguments: None,
            success: true,
            error: None,
            content: Some(content.to_string()),
            timestamp: Utc::now(),
        }
    }

    pub fn action(
        iteration: u32,
        tool: &str,
        arguments: &Map<String, Value>,
        error: Option<String>,
    ) -> Self {
        Self {
            phase: StepKind::Action,
            iteration,
            tool: (!tool.is_empty()).then(|| tool.to_string()),
            arguments: Some(arguments.clone()),
            success: error.is_none(),
            error,
            content: None,
            timestamp: Utc::now(),
        }
    }

    pub fn reflection(iteration: u32, content: &str) -> Self {
        Self {
            phase: StepKind::Reflection,
            iteration,
            tool: None,
            arguments: None,
            success: true,
            error: None,
            content: Some(content.to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// The outcome of analyzing one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub success: bool,
    /// The final answer; empty when the run failed
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub trace: Vec<TraceStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    pub iterations: u32,
    pub state: RunState,
}

impl Analysis {
    pub fn action_steps(&self) -> usize {
        self.steps(StepKind::Action)
    }

    pub fn reflection_steps(&self) -> usize {
        self.steps(StepKind::Reflection)
    }

    fn steps(&self, kind: StepKind) -> usize {
        self.trace.iter().filter(|s| s.phase == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_action_step_records_error() {
        let step = TraceStep::action(2, "", &Map::new(), Some("no action found".into()));
        assert!(!step.success);
        assert!(step.tool.is_none());
        assert_eq!(step.iteration, 2);

        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["phase"], "action");
        assert_eq!(json["error"], "no action found");
    }
}
