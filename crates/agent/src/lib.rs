//! The Tactico reasoning agent.
//!
//! A question is answered by a bounded **think → act → reflect** loop:
//!
//! 1. **Think**: the model proposes one tool call, or a final answer
//! 2. **Act**: the call is parsed, validated against the tool's schema and
//!    executed; the result (or failure) becomes an observation
//! 3. **Reflect**: the model judges whether the observations answer the
//!    question, looping back to step 1 if not
//!
//! When the evidence is sufficient, or the iteration limit is reached, a
//! final synthesis call produces the answer.

pub mod analysis;
pub mod controller;
pub mod parser;
pub mod prompts;
pub mod run_state;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use analysis::{Analysis, StepKind, TraceStep};
pub use controller::{FALLBACK_ANSWER, Phase, Run, TacticalAgent};
pub use parser::{ActionParseError, ProposedAction};
pub use run_state::{
    Confidence, Decision, FailureKind, Observation, Reflection, RunState, Termination,
    ToolCallRecord,
};
