//! The reasoning loop: THINK → ACT → REFLECT, repeated until the evidence is
//! sufficient or the iteration limit forces an answer.
//!
//! The loop is an explicit state machine. [`TacticalAgent::step`] performs one
//! transition; [`TacticalAgent::analyze_with_cancel`] drives it to a terminal
//! phase and packages the result.
//!
//! ```text
//! THINK ──final answer──▶ DONE
//!   │
//!   ▼
//!  ACT ──▶ REFLECT ──complete──▶ ANSWER ──▶ DONE
//!            │
//!            ├─continue, below limit──▶ THINK
//!            └─continue, at limit────▶ ANSWER (forced)
//! ```
//!
//! Any permanent gateway failure or cancellation moves to FAILED.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Map;
use tactico_config::AppConfig;
use tactico_core::error::{RunError, ToolError};
use tactico_core::provider::{GenerationOptions, Prompt};
use tactico_core::tool::ToolRegistry;
use tactico_providers::CompletionGateway;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analysis::{Analysis, TraceStep};
use crate::parser;
use crate::prompts;
use crate::run_state::{
    Confidence, Decision, Observation, RunState, Termination, ToolCallRecord,
};

/// Used when the synthesis call returns nothing usable.
pub const FALLBACK_ANSWER: &str = "Unable to generate an analysis from the gathered match data.";

/// Keeps the model from writing its own observations after an action.
const THINK_STOP: &str = "\nObservation:";

/// A state of the reasoning loop.
#[derive(Debug)]
pub enum Phase {
    Think,
    Act { thought: String },
    Reflect,
    Answer { forced: bool },
    Done,
    Failed(RunError),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Failed(_))
    }
}

/// Mutable state of one run: the run state plus its trace.
#[derive(Debug)]
pub struct Run {
    pub state: RunState,
    pub trace: Vec<TraceStep>,
}

impl Run {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            state: RunState::new(question),
            trace: Vec::new(),
        }
    }

    fn finish(mut self, error: Option<RunError>) -> Analysis {
        match error {
            None => {
                let answer = self.state.final_answer().unwrap_or_default().to_string();
                info!(
                    run_id = %self.state.run_id,
                    iterations = self.state.iteration_count,
                    termination = ?self.state.termination,
                    confidence = ?self.state.confidence,
                    "Analysis finished"
                );
                Analysis {
                    success: true,
                    answer,
                    error: None,
                    trace: self.trace,
                    confidence: self.state.confidence,
                    iterations: self.state.iteration_count,
                    state: self.state,
                }
            }
            Some(err) => {
                self.state.termination = Some(match err {
                    RunError::Cancelled => Termination::Cancelled,
                    _ => Termination::Failed,
                });
                warn!(
                    run_id = %self.state.run_id,
                    iterations = self.state.iteration_count,
                    error = %err,
                    "Analysis failed"
                );
                Analysis {
                    success: false,
                    answer: String::new(),
                    error: Some(err.to_string()),
                    trace: self.trace,
                    confidence: None,
                    iterations: self.state.iteration_count,
                    state: self.state,
                }
            }
        }
    }
}

/// Answers football questions by reasoning over match-data tools.
///
/// The agent holds no per-run state, so one instance can serve concurrent
/// runs.
pub struct TacticalAgent {
    gateway: Arc<CompletionGateway>,
    registry: Arc<ToolRegistry>,
    max_iterations: u32,
    tool_timeout: Duration,
    max_observation_chars: usize,
    options: GenerationOptions,
}

impl TacticalAgent {
    pub fn new(gateway: Arc<CompletionGateway>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            gateway,
            registry,
            max_iterations: 10,
            tool_timeout: Duration::from_secs(30),
            max_observation_chars: 2000,
            options: GenerationOptions::default(),
        }
    }

    /// Apply the `[agent]` limits and the `[llm]` generation settings.
    pub fn with_config(self, config: &AppConfig) -> Self {
        self.with_max_iterations(config.agent.max_iterations)
            .with_tool_timeout(Duration::from_secs(config.agent.tool_timeout_secs))
            .with_max_observation_chars(config.agent.max_observation_chars)
            .with_generation_options(GenerationOptions {
                temperature: config.llm.temperature,
                max_tokens: Some(config.llm.max_tokens),
                stop: Vec::new(),
            })
    }

    /// Set max iterations (at least 1).
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_max_observation_chars(mut self, max: usize) -> Self {
        self.max_observation_chars = max;
        self
    }

    pub fn with_generation_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn analyze(&self, question: &str) -> Analysis {
        self.analyze_with_cancel(question, &CancellationToken::new()).await
    }

    /// Run the loop to completion. Never panics and never returns an error:
    /// failures are reported through [`Analysis::success`].
    pub async fn analyze_with_cancel(&self, question: &str, cancel: &CancellationToken) -> Analysis {
        let question = question.trim();
        let mut run = Run::new(question);
        info!(
            run_id = %run.state.run_id,
            max_iterations = self.max_iterations,
            "Starting analysis: {question}"
        );

        let mut phase = if question.is_empty() {
            Phase::Failed(RunError::EmptyQuestion)
        } else {
            Phase::Think
        };

        loop {
            phase = match phase {
                Phase::Done => return run.finish(None),
                Phase::Failed(err) => return run.finish(Some(err)),
                other => self.step(other, &mut run, cancel).await,
            };
        }
    }

    /// Perform one transition. Terminal phases are returned unchanged.
    pub async fn step(&self, phase: Phase, run: &mut Run, cancel: &CancellationToken) -> Phase {
        if phase.is_terminal() {
            return phase;
        }
        if cancel.is_cancelled() {
            return Phase::Failed(RunError::Cancelled);
        }

        let next = match phase {
            Phase::Think => self.think(run, cancel).await,
            Phase::Act { thought } => self.act(&thought, run, cancel).await,
            Phase::Reflect => self.reflect(run, cancel).await,
            Phase::Answer { forced } => self.answer(forced, run, cancel).await,
            terminal => Ok(terminal),
        };
        let next = next.unwrap_or_else(Phase::Failed);
        debug!(run_id = %run.state.run_id, next = ?next, "Transition");
        next
    }

    async fn think(&self, run: &mut Run, cancel: &CancellationToken) -> Result<Phase, RunError> {
        let state = &mut run.state;
        state.iteration_count += 1;
        let iteration = state.iteration_count;

        let prompt = prompts::think_prompt(state, &self.registry, self.max_observation_chars);
        let mut options = self.options.clone();
        options.stop.push(THINK_STOP.to_string());
        let raw = self.complete(&prompt, &options, cancel).await?;

        let thought = parser::strip_reasoning(&raw);
        debug!(iteration, "THINK output: {thought}");
        state.thoughts.push(thought.clone());
        run.trace.push(TraceStep::thought(iteration, &thought));

        if let Some(answer) = parser::extract_final_answer(&thought) {
            info!(iteration, "Final answer in thought, stopping early");
            state.set_final_answer(answer);
            state.termination = Some(Termination::EarlyStop);
            state.confidence = Some(Confidence::assess(state, false));
            return Ok(Phase::Done);
        }
        Ok(Phase::Act { thought })
    }

    async fn act(&self, thought: &str, run: &mut Run, cancel: &CancellationToken) -> Result<Phase, RunError> {
        let iteration = run.state.iteration_count;

        let validated = parser::parse_action(thought, &self.registry)
            .map_err(|e| {
                let call = ToolCallRecord {
                    name: e.proposed_name().to_string(),
                    arguments: Map::new(),
                    dispatched: false,
                };
                (call, Observation::failure(e.kind(), e.to_string()))
            })
            .and_then(|action| {
                self.registry
                    .validate(&action.tool, &action.arguments)
                    .map_err(|e| {
                        let call = ToolCallRecord {
                            name: action.tool.clone(),
                            arguments: action.arguments.clone(),
                            dispatched: false,
                        };
                        (call, Observation::from(&e))
                    })
            });

        let (name, arguments) = match validated {
            Ok(valid) => valid,
            Err((call, observation)) => {
                run.state.parse_failures += 1;
                let message = match &observation {
                    Observation::Failure { message, .. } => message.clone(),
                    Observation::Success { .. } => String::new(),
                };
                warn!(iteration, tool = %call.name, "Could not dispatch action: {message}");
                run.trace
                    .push(TraceStep::action(iteration, &call.name, &call.arguments, Some(message)));
                run.state.record(call, observation);
                return Ok(Phase::Reflect);
            }
        };

        debug!(iteration, tool = %name, arguments = %serde_json::Value::Object(arguments.clone()), "Dispatching tool");
        let result = tokio::time::timeout(self.tool_timeout, self.registry.invoke(&name, &arguments)).await;
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        let observation = match result {
            Ok(Ok(output)) => {
                if let Some(query) = &output.query {
                    debug!(tool = %name, "Query: {query}");
                }
                Observation::Success { data: output.data }
            }
            Ok(Err(e)) => {
                warn!(tool = %name, error = %e, "Tool execution failed");
                Observation::from(&e)
            }
            Err(_) => {
                let e = ToolError::Timeout {
                    tool_name: name.clone(),
                    timeout_secs: self.tool_timeout.as_secs(),
                };
                warn!(tool = %name, error = %e, "Tool timed out");
                Observation::from(&e)
            }
        };

        let error = match &observation {
            Observation::Failure { message, .. } => Some(message.clone()),
            Observation::Success { .. } => None,
        };
        run.trace.push(TraceStep::action(iteration, &name, &arguments, error));
        run.state.record(
            ToolCallRecord {
                name,
                arguments,
                dispatched: true,
            },
            observation,
        );
        Ok(Phase::Reflect)
    }

    async fn reflect(&self, run: &mut Run, cancel: &CancellationToken) -> Result<Phase, RunError> {
        let iteration = run.state.iteration_count;
        let prompt = prompts::reflect_prompt(&run.state, self.max_observation_chars);
        let raw = self.complete(&prompt, &self.options, cancel).await?;

        let text = parser::strip_reasoning(&raw);
        let reflection = parser::parse_reflection(&text);
        if !reflection.explicit {
            warn!(iteration, "Ambiguous reflection, continuing");
        }
        let decision = reflection.decision;
        run.trace.push(TraceStep::reflection(iteration, &text));
        run.state.reflections.push(reflection);

        Ok(match decision {
            Decision::Complete => Phase::Answer { forced: false },
            Decision::Continue if iteration < self.max_iterations => Phase::Think,
            Decision::Continue => {
                warn!(iteration, max_iterations = self.max_iterations, "Iteration limit reached, forcing an answer");
                Phase::Answer { forced: true }
            }
        })
    }

    async fn answer(&self, forced: bool, run: &mut Run, cancel: &CancellationToken) -> Result<Phase, RunError> {
        let prompt = prompts::answer_prompt(&run.state, self.max_observation_chars, forced);
        let raw = self.complete(&prompt, &self.options, cancel).await?;

        let cleaned = parser::strip_reasoning(&raw);
        let answer = match parser::strip_answer_marker(&cleaned) {
            "" => FALLBACK_ANSWER,
            text => text,
        };

        let state = &mut run.state;
        state.set_final_answer(answer);
        state.termination = Some(if forced {
            Termination::ForcedFinalization
        } else {
            Termination::Completed
        });
        state.confidence = Some(Confidence::assess(state, !forced));
        Ok(Phase::Done)
    }

    /// One gateway call. A result that arrives after cancellation is dropped.
    async fn complete(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
        cancel: &CancellationToken,
    ) -> Result<String, RunError> {
        debug!(chars = prompt.user.len(), "Prompt:\n{}", prompt.user);
        let text = self.gateway.complete(prompt, options).await?;
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StepKind;
    use crate::run_state::FailureKind;
    use crate::test_helpers::*;
    use serde_json::json;
    use tactico_core::error::ProviderError;
    use tactico_graph::ScriptedGraph;
    use tactico_tools::match_registry;

    fn goal_graph() -> Arc<ScriptedGraph> {
        Arc::new(ScriptedGraph::new().on(
            "shot_outcome = 'Goal'",
            vec![json!({
                "event_id": "a1b2", "minute": 23, "second": 11, "period": 1,
                "player": "Lionel Messi", "team": "Barcelona", "xg": 0.31
            })],
        ))
    }

    fn agent(provider: Arc<SequentialMockProvider>, graph: Arc<ScriptedGraph>) -> TacticalAgent {
        let gateway = CompletionGateway::new(provider, "mock-model");
        TacticalAgent::new(Arc::new(gateway), Arc::new(match_registry(graph)))
    }

    fn assert_invariants(analysis: &Analysis, max_iterations: u32) {
        let state = &analysis.state;
        assert!(state.iteration_count <= max_iterations);
        assert_eq!(state.tool_calls.len(), state.tool_results.len());
        assert_eq!(state.final_answer().is_some(), analysis.success);
        if analysis.success {
            assert_eq!(state.thoughts.len(), state.iteration_count as usize);
        }
    }

    #[tokio::test]
    async fn find_the_first_goal() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "Thought: I need the goals.\nAction: find_goals\nAction Input: {}",
            "Decision: complete\nRationale: The first goal is in the results.",
            "Final Answer: Lionel Messi scored first for Barcelona in the 23rd minute.",
        ]));
        let agent = agent(provider.clone(), goal_graph());
        let analysis = agent.analyze("Find the first goal").await;

        assert!(analysis.success, "{:?}", analysis.error);
        assert_eq!(analysis.answer, "Lionel Messi scored first for Barcelona in the 23rd minute.");
        assert_eq!(analysis.action_steps(), 1);
        assert_eq!(analysis.reflection_steps(), 1);
        assert_eq!(analysis.state.parse_failures, 0);
        assert_eq!(analysis.state.tool_calls[0].name, "find_goals");
        assert!(analysis.state.tool_calls[0].arguments.is_empty());
        assert!(analysis.state.tool_results[0].is_success());
        assert_eq!(analysis.confidence, Some(Confidence::High));
        assert_eq!(analysis.state.termination, Some(Termination::Completed));
        assert_eq!(provider.call_count(), 3);
        assert_invariants(&analysis, 10);
    }

    #[tokio::test]
    async fn final_answer_in_thought_stops_early() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "<think>This is common knowledge.</think>Thought: I know this.\nFinal Answer: There were no goals.",
        ]));
        let agent = agent(provider.clone(), goal_graph());
        let analysis = agent.analyze("Were there goals?").await;

        assert!(analysis.success);
        assert_eq!(analysis.answer, "There were no goals.");
        assert_eq!(analysis.action_steps(), 0);
        assert_eq!(analysis.reflection_steps(), 0);
        assert_eq!(analysis.state.termination, Some(Termination::EarlyStop));
        assert_eq!(analysis.confidence, Some(Confidence::Low));
        assert_eq!(analysis.state.thoughts.len() as u32, analysis.state.iteration_count);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn free_text_thought_records_failure_and_continues() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "Barcelona probably dominated the ball.",
            "Decision: continue\nRationale: No data yet.",
            "Action: find_goals\nAction Input: {}",
            "Decision: complete",
            "Messi scored in the 23rd minute.",
        ]));
        let agent = agent(provider.clone(), goal_graph());
        let analysis = agent.analyze("Who scored?").await;

        assert!(analysis.success);
        let state = &analysis.state;
        assert_eq!(state.iteration_count, 2);
        assert_eq!(state.parse_failures, 1);
        assert!(!state.tool_calls[0].dispatched);
        assert!(matches!(
            state.tool_results[0],
            Observation::Failure { kind: FailureKind::NoActionFound, .. }
        ));
        assert!(state.tool_calls[1].dispatched);
        assert!(!analysis.trace.iter().find(|s| s.phase == StepKind::Action).unwrap().success);

        let first_reflect = &provider.requests()[1];
        assert!(first_reflect.messages[1].content.contains("no_action_found"));
        assert_eq!(analysis.confidence, Some(Confidence::High));
        assert_invariants(&analysis, 10);
    }

    #[tokio::test]
    async fn iteration_limit_forces_an_answer() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "Action: find_goals\nAction Input: {}",
            "Decision: continue",
            "Final Answer: Messi scored at 23'.",
        ]));
        let agent = agent(provider.clone(), goal_graph()).with_max_iterations(1);
        let analysis = agent.analyze("Who scored?").await;

        assert!(analysis.success);
        assert_eq!(analysis.answer, "Messi scored at 23'.");
        assert_eq!(analysis.state.iteration_count, 1);
        assert_eq!(analysis.state.thoughts.len(), 1);
        assert_eq!(analysis.state.termination, Some(Termination::ForcedFinalization));
        assert_eq!(analysis.confidence, Some(Confidence::Medium));
        assert_eq!(provider.call_count(), 3);

        let answer_request = &provider.requests()[2];
        assert!(answer_request.messages[1].content.contains("step limit"));
        assert_invariants(&analysis, 1);
    }

    #[tokio::test]
    async fn ambiguous_reflection_continues() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "Action: find_goals\nAction Input: {}",
            "Hmm, hard to say.",
            "Final Answer: Messi.",
        ]));
        let agent = agent(provider, goal_graph()).with_max_iterations(3);
        let analysis = agent.analyze("Who scored?").await;

        assert!(analysis.success);
        assert_eq!(analysis.state.iteration_count, 2);
        assert!(!analysis.state.reflections[0].explicit);
        assert_eq!(analysis.state.reflections[0].decision, Decision::Continue);
        assert_eq!(analysis.state.termination, Some(Termination::EarlyStop));
        assert_eq!(analysis.confidence, Some(Confidence::Medium));
    }

    #[tokio::test]
    async fn unknown_tool_and_bad_arguments_become_observations() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "Action: predict_score\nAction Input: {}",
            "Decision: continue",
            "Action: get_event_context\nAction Input: {\"window\": 2}",
            "Decision: continue",
            "Action: find_events\nAction Input: {\"minute\": \"late\"}",
            "Decision: continue",
            "I could not find the data.",
        ]));
        let agent = agent(provider, goal_graph()).with_max_iterations(3);
        let analysis = agent.analyze("What happened late on?").await;

        assert!(analysis.success);
        let kinds: Vec<FailureKind> = analysis
            .state
            .tool_results
            .iter()
            .map(|o| match o {
                Observation::Failure { kind, .. } => *kind,
                Observation::Success { .. } => panic!("expected failures"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![FailureKind::UnknownTool, FailureKind::MissingParameter, FailureKind::TypeMismatch]
        );
        assert_eq!(analysis.state.parse_failures, 3);
        assert_eq!(analysis.state.tool_calls[0].name, "predict_score");
        assert_eq!(analysis.confidence, Some(Confidence::Low));
        assert_eq!(analysis.state.termination, Some(Termination::ForcedFinalization));
        assert_invariants(&analysis, 3);
    }

    #[tokio::test]
    async fn tool_errors_do_not_end_the_run() {
        let graph = Arc::new(ScriptedGraph::new().failing(
            "shot_outcome = 'Goal'",
            tactico_core::error::GraphError::Connection("connection refused".into()),
        ));
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "Action: find_goals\nAction Input: {}",
            "Decision: complete",
            "",
        ]));
        let agent = agent(provider, graph);
        let analysis = agent.analyze("Who scored?").await;

        assert!(analysis.success);
        assert_eq!(analysis.answer, FALLBACK_ANSWER);
        assert!(matches!(
            analysis.state.tool_results[0],
            Observation::Failure { kind: FailureKind::ExecutionFailed, .. }
        ));
        assert!(analysis.state.tool_calls[0].dispatched);
        assert_eq!(analysis.state.parse_failures, 0);
        assert_eq!(analysis.confidence, Some(Confidence::Low));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tools_time_out() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "Action: slow_query\nAction Input: {}",
            "Decision: complete",
            "No data.",
        ]));
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(SlowTool));
        let gateway = CompletionGateway::new(provider, "mock-model");
        let agent = TacticalAgent::new(Arc::new(gateway), Arc::new(registry))
            .with_tool_timeout(Duration::from_secs(2));
        let analysis = agent.analyze("Anything?").await;

        assert!(analysis.success);
        match &analysis.state.tool_results[0] {
            Observation::Failure { kind, message } => {
                assert_eq!(*kind, FailureKind::Timeout);
                assert!(message.contains("2s"));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn gateway_failure_fails_the_run() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let agent = agent(provider, goal_graph());
        let analysis = agent.analyze("Who scored?").await;

        assert!(!analysis.success);
        assert!(analysis.answer.is_empty());
        assert!(analysis.state.final_answer().is_none());
        assert!(analysis.error.unwrap().contains("bad key"));
        assert_eq!(analysis.state.termination, Some(Termination::Failed));
        assert!(analysis.confidence.is_none());
        // the failed THINK counted its iteration but produced no thought
        assert_eq!(analysis.state.iteration_count, 1);
        assert!(analysis.state.thoughts.is_empty());
    }

    #[tokio::test]
    async fn empty_question_never_calls_the_model() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let agent = agent(provider.clone(), goal_graph());
        let analysis = agent.analyze("   ").await;

        assert!(!analysis.success);
        assert_eq!(analysis.error.as_deref(), Some("question is empty"));
        assert_eq!(analysis.state.iteration_count, 0);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let agent = agent(provider.clone(), goal_graph());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let analysis = agent.analyze_with_cancel("Who scored?", &cancel).await;

        assert!(!analysis.success);
        assert_eq!(analysis.state.termination, Some(Termination::Cancelled));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn late_results_are_discarded_after_cancellation() {
        let cancel = CancellationToken::new();
        let provider = Arc::new(
            SequentialMockProvider::texts(&["Action: find_goals\nAction Input: {}"])
                .cancel_after_call(cancel.clone()),
        );
        let agent = agent(provider.clone(), goal_graph());
        let analysis = agent.analyze_with_cancel("Who scored?", &cancel).await;

        assert!(!analysis.success);
        assert_eq!(analysis.error.as_deref(), Some("run cancelled"));
        assert!(analysis.state.thoughts.is_empty());
        assert!(analysis.state.tool_calls.is_empty());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn think_requests_stop_at_observation() {
        let provider = Arc::new(SequentialMockProvider::texts(&["Final Answer: 1-0."]));
        let agent = agent(provider.clone(), goal_graph());
        agent.analyze("Score?").await;

        let request = &provider.requests()[0];
        assert_eq!(request.stop, vec![THINK_STOP.to_string()]);
        assert!(request.messages[1].content.contains("find_goals()"));
    }

    #[tokio::test]
    async fn step_leaves_terminal_phases_alone() {
        let provider = Arc::new(SequentialMockProvider::texts(&[]));
        let agent = agent(provider, goal_graph());
        let mut run = Run::new("q");
        let cancel = CancellationToken::new();
        assert!(matches!(agent.step(Phase::Done, &mut run, &cancel).await, Phase::Done));
        assert!(run.trace.is_empty());
    }
}
