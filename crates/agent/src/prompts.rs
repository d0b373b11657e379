//! Prompt assembly for the THINK, REFLECT and ANSWER phases.
//!
//! Every function here is pure: the same question, run state and registry
//! always render the same prompt text.

use std::fmt::Write as _;

use serde_json::Value;
use tactico_core::provider::Prompt;
use tactico_core::tool::ToolRegistry;

use crate::run_state::{Decision, Observation, RunState};

pub const SYSTEM_PROMPT: &str = "\
You are a tactical football analyst. Answer questions using match data only. Be concise.

Rules:
1. Only facts from tool results. No speculation.
2. Use exact team and player names as they appear in tool results or the question.
3. Never add players, statistics or details that are not in the tool data.
4. Never invent event ids. Find real ones with find_events or find_goals first.
5. If a statistic is not in the returned data, do not mention it.

Event types in the database: Shot, Pass, Dribble, Duel, Pressure, Interception, \
Ball Recovery, Clearance, Foul Committed, Carry.
A goal is a Shot whose outcome is Goal; there is no Goal event type.

For a specific moment (the first goal, minute 50, a named player's tackle), locate \
the event with find_goals or find_events, then use get_event_context or \
get_possession_before_event with its id.
For period-wide questions (pressing, possession, shape), use get_pressing_intensity, \
get_possession_stats or get_team_formation directly.";

const NO_OBSERVATIONS: &str = "(no tool results yet)";

/// Prompt for the THINK phase: choose one tool or give the final answer.
pub fn think_prompt(state: &RunState, registry: &ToolRegistry, max_chars: usize) -> Prompt {
    let mut user = String::new();
    let _ = writeln!(user, "Question: {}\n", state.question());
    let _ = writeln!(user, "Available tools (call exactly one):");
    user.push_str(&registry.render_descriptions());

    if !state.tool_calls.is_empty() {
        user.push_str("\nPrevious steps:\n");
        user.push_str(&render_history(state, max_chars));
    }

    user.push_str(
        "\nRespond in exactly this format:\n\
         Thought: <one or two sentences on what you need next>\n\
         Action: <one tool name>\n\
         Action Input: <JSON object with only that tool's parameters, {} if none>\n\n\
         If the tool results already answer the question, respond instead with:\n\
         Final Answer: <1-4 sentences using only facts from the tool results>\n",
    );
    Prompt::new(SYSTEM_PROMPT, user)
}

/// Prompt for the REFLECT phase: judge whether the evidence is sufficient.
pub fn reflect_prompt(state: &RunState, max_chars: usize) -> Prompt {
    let mut user = String::new();
    let _ = writeln!(user, "Question: {}\n", state.question());
    user.push_str("Tool results from the match database:\n");
    user.push_str(&render_results(state, max_chars));

    user.push_str(
        "\nCan the question be answered from these results alone?\n\
         - If yes, decide complete.\n\
         - If a specific event or statistic is still missing, decide continue.\n\
         - Failed tool calls do not count as evidence.\n\n\
         Respond in exactly this format:\n\
         Decision: complete | continue\n\
         Rationale: <one sentence>\n",
    );
    Prompt::new(SYSTEM_PROMPT, user)
}

/// Prompt for the ANSWER phase: synthesize from everything gathered.
pub fn answer_prompt(state: &RunState, max_chars: usize, forced: bool) -> Prompt {
    let mut user = String::new();
    let _ = writeln!(user, "Question: {}\n", state.question());

    if !state.thoughts.is_empty() {
        user.push_str("Reasoning so far:\n");
        for (i, thought) in state.thoughts.iter().enumerate() {
            let _ = writeln!(user, "{}. {}", i + 1, first_line(thought));
        }
        user.push('\n');
    }

    user.push_str("Tool results from the match database:\n");
    user.push_str(&render_results(state, max_chars));

    if !state.reflections.is_empty() {
        user.push_str("\nReflections:\n");
        for (i, reflection) in state.reflections.iter().enumerate() {
            let _ = write!(user, "{}. {}", i + 1, decision_str(reflection.decision));
            if let Some(rationale) = &reflection.rationale {
                let _ = write!(user, ": {}", first_line(rationale));
            }
            user.push('\n');
        }
    }

    if forced {
        user.push_str(
            "\nThe step limit has been reached. Answer with the best evidence above; \
             if it is insufficient, say which data is missing.\n",
        );
    }
    user.push_str(
        "\nWrite the final answer in 1-4 sentences using only facts from the tool results. \
         Include minute, period or score where relevant. Do not mention tools.\n",
    );
    Prompt::new(SYSTEM_PROMPT, user)
}

/// Render an observation as compact JSON, truncated to `max_chars` characters.
pub fn render_observation(observation: &Observation, max_chars: usize) -> String {
    let text = match observation {
        Observation::Success { data } => compact(data),
        Observation::Failure { kind, message } => format!("ERROR ({}): {message}", kind.as_str()),
    };
    truncate_chars(&text, max_chars)
}

fn compact(data: &Value) -> String {
    serde_json::to_string(data).unwrap_or_else(|_| data.to_string())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let dropped = text[idx..].chars().count();
            format!("{}... [truncated {dropped} chars]", &text[..idx])
        }
        None => text.to_string(),
    }
}

fn render_history(state: &RunState, max_chars: usize) -> String {
    let mut out = String::new();
    for (i, (call, observation)) in state.tool_calls.iter().zip(&state.tool_results).enumerate() {
        let _ = writeln!(out, "Step {}:", i + 1);
        if let Some(thought) = state.thoughts.get(i) {
            let _ = writeln!(out, "Thought: {}", first_line(thought));
        }
        if call.name.is_empty() {
            out.push_str("Action: (none)\n");
        } else {
            let _ = writeln!(
                out,
                "Action: {}\nAction Input: {}",
                call.name,
                compact(&Value::Object(call.arguments.clone()))
            );
        }
        let _ = writeln!(out, "Observation: {}", render_observation(observation, max_chars));
        if let Some(reflection) = state.reflections.get(i) {
            let _ = writeln!(out, "Reflection: {}", decision_str(reflection.decision));
        }
    }
    out
}

fn render_results(state: &RunState, max_chars: usize) -> String {
    if state.tool_calls.is_empty() {
        return format!("{NO_OBSERVATIONS}\n");
    }
    let mut out = String::new();
    for (call, observation) in state.tool_calls.iter().zip(&state.tool_results) {
        let name = if call.name.is_empty() { "(no action)" } else { call.name.as_str() };
        let _ = writeln!(out, "- {name}: {}", render_observation(observation, max_chars));
    }
    out
}

fn first_line(text: &str) -> &str {
    text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
}

fn decision_str(decision: Decision) -> &'static str {
    match decision {
        Decision::Continue => "continue",
        Decision::Complete => "complete",
    }
}
