//! Parsing of free-form model output.
//!
//! Small local models rarely produce exactly the requested format, so every
//! parser here is lenient and none of them panic. THINK output is scanned for
//! a final answer or a tool call; REFLECT output for a continue/complete
//! decision.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tactico_core::tool::{ToolRegistry, normalize_tool_name};
use thiserror::Error;

use crate::run_state::{Decision, FailureKind, Reflection};

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").unwrap());

static FINAL_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfinal[ \t]+answer\b[ \t*]*:[\s*]*").unwrap());

static ACTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t>*\-#]*action[ \t*]*:[ \t*]*(.*?)[ \t]*$").unwrap());

static ACTION_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t>*\-#]*action[ \t]+input[ \t*]*:[ \t*]*").unwrap());

static DECISION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t>*\-#]*decision[ \t*]*:[ \t*`]*(complete|continue)\b").unwrap()
});

static RATIONALE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ims)^[ \t>*\-#]*(?:rationale|reason(?:ing)?)[ \t*]*:[ \t*]*(.+)").unwrap()
});

const NAME_KEYS: &[&str] = &["action", "tool", "name"];
const ARGUMENT_KEYS: &[&str] = &["action_input", "arguments", "args", "input", "parameters"];

/// A tool call extracted from model output, resolved to a registered tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedAction {
    pub tool: String,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionParseError {
    #[error("no action found in model output")]
    NoActionFound,

    #[error("malformed arguments for {tool}: {reason}")]
    MalformedArguments { tool: String, reason: String },

    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },
}

impl ActionParseError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ActionParseError::NoActionFound => FailureKind::NoActionFound,
            ActionParseError::MalformedArguments { .. } => FailureKind::MalformedArguments,
            ActionParseError::UnknownTool { .. } => FailureKind::UnknownTool,
        }
    }

    /// The tool name the model proposed, if any.
    pub fn proposed_name(&self) -> &str {
        match self {
            ActionParseError::NoActionFound => "",
            ActionParseError::MalformedArguments { tool, .. } => tool,
            ActionParseError::UnknownTool { name } => name,
        }
    }
}

/// Remove `<think>...</think>` reasoning blocks emitted by reasoning models.
///
/// An unterminated opening tag drops everything after it; a stray closing
/// tag drops everything before it.
pub fn strip_reasoning(text: &str) -> String {
    let without = THINK_BLOCK.replace_all(text, "");
    let mut rest: &str = &without;
    if let Some(idx) = rest.rfind("</think>") {
        rest = &rest[idx + "</think>".len()..];
    }
    if let Some(idx) = rest.find("<think>") {
        rest = &rest[..idx];
    }
    rest.trim().to_string()
}

/// The text following a `Final Answer:` marker, if it is non-empty.
pub fn extract_final_answer(text: &str) -> Option<String> {
    let found = FINAL_ANSWER.find(text)?;
    let answer = text[found.end()..].trim();
    (!answer.is_empty()).then(|| answer.to_string())
}

/// Drop a leading `Final Answer:` marker from synthesized text.
pub fn strip_answer_marker(text: &str) -> &str {
    let trimmed = text.trim_start_matches(|c: char| c.is_whitespace() || c == '*');
    match FINAL_ANSWER.find(trimmed) {
        Some(found) if found.start() == 0 => trimmed[found.end()..].trim(),
        _ => text.trim(),
    }
}

/// Interpret REFLECT output. Anything ambiguous becomes a non-explicit
/// `continue`.
pub fn parse_reflection(text: &str) -> Reflection {
    let cleaned = strip_reasoning(text);
    let rationale = RATIONALE
        .captures(&cleaned)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|r| !r.is_empty());

    let explicit = |decision| Reflection {
        decision,
        rationale: rationale.clone(),
        explicit: true,
    };

    if let Some(word) = DECISION_LINE.captures(&cleaned).and_then(|c| c.get(1)) {
        return explicit(decision_word(word.as_str()).unwrap_or(Decision::Continue));
    }

    let bare = cleaned
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | '*' | '`' | '"' | '\''))
        .to_ascii_lowercase();
    if let Some(decision) = decision_word(&bare) {
        return explicit(decision);
    }

    if extract_final_answer(&cleaned).is_some() {
        return explicit(Decision::Complete);
    }
    if ACTION_LINE.is_match(&cleaned) {
        return explicit(Decision::Continue);
    }

    Reflection {
        decision: Decision::Continue,
        rationale,
        explicit: false,
    }
}

fn decision_word(word: &str) -> Option<Decision> {
    match word.to_ascii_lowercase().as_str() {
        "complete" => Some(Decision::Complete),
        "continue" => Some(Decision::Continue),
        _ => None,
    }
}

/// Extract a tool call from THINK output.
pub fn parse_action(text: &str, registry: &ToolRegistry) -> Result<ProposedAction, ActionParseError> {
    let cleaned = strip_reasoning(text);

    let action_line = ACTION_LINE.captures(&cleaned).and_then(|c| {
        let name = c.get(1)?;
        if name.as_str().trim().is_empty() {
            name_on_next_line(&cleaned, c.get(0)?.end())
        } else {
            Some((name.start(), name.as_str()))
        }
    });

    let (raw_name, arguments) = match action_line {
        Some((_, line)) if !line.trim_start().starts_with('{') => {
            if let Some(open) = line.find('(') {
                // find_events(event_type="Shot", limit=5)
                let name = &line[..open];
                let inner = match line.rfind(')') {
                    Some(close) if close > open => &line[open + 1..close],
                    _ => &line[open + 1..],
                };
                (name.to_string(), parse_call_arguments(inner))
            } else if let Some(brace) = line.find('{') {
                let name = &line[..brace];
                (name.to_string(), parse_object_text(&line[brace..]))
            } else {
                (line.to_string(), action_input(&cleaned))
            }
        }
        Some((start, _)) => json_action(&cleaned[start..])?,
        None => json_action(&cleaned)?,
    };

    let name = normalize_tool_name(&raw_name);
    if name.is_empty() || matches!(name.as_str(), "none" | "null" | "n/a") {
        return Err(ActionParseError::NoActionFound);
    }

    let tool = registry
        .resolve(&name)
        .ok_or_else(|| ActionParseError::UnknownTool { name: name.clone() })?;

    let arguments = arguments.map_err(|reason| ActionParseError::MalformedArguments {
        tool: tool.name().to_string(),
        reason,
    })?;

    Ok(ProposedAction {
        tool: tool.name().to_string(),
        arguments,
    })
}

type ArgumentResult = Result<Map<String, Value>, String>;

/// A bare `Action:` marker with the tool name on the next non-empty line.
fn name_on_next_line(text: &str, from: usize) -> Option<(usize, &str)> {
    let mut offset = from;
    for raw in text[from..].split_inclusive('\n') {
        let line = raw.trim();
        if line.is_empty() {
            offset += raw.len();
            continue;
        }
        if line.starts_with('{') || line.starts_with("```") || ACTION_INPUT.is_match(line) {
            return None;
        }
        let indent = raw.len() - raw.trim_start().len();
        return Some((offset + indent, line));
    }
    None
}

/// The object following an `Action Input:` marker. Missing, empty or `None`
/// input is an empty mapping.
fn action_input(text: &str) -> Result<Map<String, Value>, String> {
    let Some(marker) = ACTION_INPUT.find(text) else {
        return Ok(Map::new());
    };
    let rest = strip_fence(&text[marker.end()..]);
    let first_line = rest.lines().next().unwrap_or("").trim();

    if rest.trim_start().starts_with('{') {
        return parse_object_text(rest.trim_start());
    }
    if is_empty_input(first_line) {
        return Ok(Map::new());
    }
    Err(format!("expected an object, got '{}'", truncate(first_line, 80)))
}

/// Find a JSON-style `{"action": ..., "action_input": {...}}` object.
fn json_action(text: &str) -> Result<(String, ArgumentResult), ActionParseError> {
    let object = object_candidates(strip_fence(text))
        .into_iter()
        .find_map(|candidate| parse_object(candidate).ok())
        .ok_or(ActionParseError::NoActionFound)?;

    let name = NAME_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .ok_or(ActionParseError::NoActionFound)?
        .to_string();

    let arguments = match ARGUMENT_KEYS.iter().find_map(|key| object.get(*key)) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(Value::String(s)) if is_empty_input(s.trim()) => Ok(Map::new()),
        Some(Value::String(s)) => parse_object_text(s),
        Some(other) => Err(format!("expected an object, got {other}")),
    };
    Ok((name, arguments))
}

fn is_empty_input(s: &str) -> bool {
    matches!(
        s.trim_matches(|c: char| matches!(c, '`' | '"' | '\'')).to_ascii_lowercase().as_str(),
        "" | "none" | "null" | "{}" | "n/a"
    )
}

fn parse_call_arguments(inner: &str) -> Result<Map<String, Value>, String> {
    let inner = inner.trim();
    if inner.is_empty() {
        return Ok(Map::new());
    }
    if inner.starts_with('{') {
        return parse_object_text(inner);
    }
    parse_object(&format!("{{{inner}}}"))
}

fn parse_object_text(text: &str) -> Result<Map<String, Value>, String> {
    let mut first_error = None;
    for candidate in object_candidates(text) {
        match parse_object(candidate) {
            Ok(map) => return Ok(map),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or_else(|| "expected an object".to_string()))
}

/// Spans that may hold the object starting at the first `{`: the balanced
/// object, then everything up to the last `}`, then the rest of that line.
fn object_candidates(text: &str) -> Vec<&str> {
    let Some(start) = text.find('{') else {
        return Vec::new();
    };
    let text = &text[start..];
    let mut candidates = Vec::with_capacity(3);
    if let Some(balanced) = extract_object(text) {
        candidates.push(balanced);
    }
    if let Some(close) = text.rfind('}') {
        candidates.push(&text[..=close]);
    }
    candidates.push(text.lines().next().unwrap_or(text));
    candidates.dedup();
    candidates
}

/// Parse an object strictly as JSON, then leniently.
fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected an object, got {other}")),
        Err(_) => Lenient::new(text).object_only(),
    }
}

fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim_start();
    let Some(after) = trimmed.strip_prefix("```") else {
        return text;
    };
    // Skip the language tag.
    let body = after.split_once('\n').map(|(_, b)| b).unwrap_or(after);
    body.split("```").next().unwrap_or(body)
}

/// The first balanced `{...}` in `text`, honoring quoted strings.
///
/// A quote only opens a string where a key or value starts, so apostrophes
/// inside bare tokens (`N'Golo Kante`) are plain characters.
fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev = '{';

    for (offset, c) in text[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
                prev = c;
            }
            continue;
        }
        if c.is_whitespace() {
            continue;
        }
        let opens_token = matches!(prev, '{' | '[' | ',' | ':' | '=');
        prev = c;
        match c {
            '"' | '\'' if opens_token => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// A forgiving parser for the almost-JSON small models write: bare or
/// single-quoted keys and values, `=` separators, trailing commas and
/// Python literals.
struct Lenient {
    chars: Vec<char>,
    pos: usize,
}

impl Lenient {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn object_only(mut self) -> Result<Map<String, Value>, String> {
        self.skip_ws();
        let map = self.object()?;
        self.skip_ws();
        if self.pos < self.chars.len() {
            return Err(format!("unexpected trailing input at offset {}", self.pos));
        }
        Ok(map)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, c: char) -> Result<(), String> {
        match self.peek() {
            Some(found) if found == c => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(format!("expected '{c}' at offset {}, found '{found}'", self.pos)),
            None => Err(format!("expected '{c}', found end of input")),
        }
    }

    fn object(&mut self) -> Result<Map<String, Value>, String> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('}') => {
                    self.pos += 1;
                    return Ok(map);
                }
                // A missing closing brace ends the object at end of input.
                None => return Ok(map),
                _ => {}
            }

            let key = self.key()?;
            self.skip_ws();
            match self.peek() {
                Some(':') | Some('=') => self.pos += 1,
                _ => return Err(format!("expected ':' or '=' after key '{key}'")),
            }
            self.skip_ws();
            let value = self.value()?;
            map.insert(key, value);

            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {}
                Some(c) => return Err(format!("unexpected '{c}' at offset {}", self.pos)),
                None => return Ok(map),
            }
        }
    }

    fn array(&mut self) -> Result<Value, String> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                None => return Err("unterminated array".into()),
                _ => {}
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {}
                Some(c) => return Err(format!("unexpected '{c}' at offset {}", self.pos)),
                None => return Err("unterminated array".into()),
            }
        }
    }

    fn key(&mut self) -> Result<String, String> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => self.string(q),
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '-'))
                {
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(format!("expected a key at offset {}", self.pos));
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, String> {
        self.expect(quote)?;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => {
                    if let Some(next) = self.peek() {
                        self.pos += 1;
                        out.push(match next {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                    }
                }
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err("unterminated string".into())
    }

    fn value(&mut self) -> Result<Value, String> {
        match self.peek() {
            Some('{') => self.object().map(Value::Object),
            Some('[') => self.array(),
            Some(q @ ('"' | '\'')) => {
                let open = self.pos;
                match self.string(q) {
                    Ok(s) => Ok(Value::String(s)),
                    // Unterminated: read it as a bare token up to the next separator.
                    Err(_) => {
                        self.pos = open + 1;
                        Ok(self.bare())
                    }
                }
            }
            Some(_) => Ok(self.bare()),
            None => Err("expected a value, found end of input".into()),
        }
    }

    /// An unquoted scalar, read up to the next separator.
    fn bare(&mut self) -> Value {
        let start = self.pos;
        while self.peek().is_some_and(|c| !matches!(c, ',' | '}' | ']')) {
            self.pos += 1;
        }
        let token: String = self.chars[start..self.pos].iter().collect();
        let token = token.trim().trim_matches(|c: char| matches!(c, '"' | '\''));
        match token {
            "true" | "True" => Value::Bool(true),
            "false" | "False" => Value::Bool(false),
            "null" | "None" | "none" => Value::Null,
            _ => {
                if let Ok(i) = token.parse::<i64>() {
                    Value::from(i)
                } else if let Some(n) = token.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                    Value::Number(n)
                } else {
                    Value::String(token.to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tactico_core::error::ToolError;
    use tactico_core::tool::{ParamKind, ParamSpec, ParameterSchema, Tool, ToolOutput};

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "test tool"
        }
        fn parameters(&self) -> ParameterSchema {
            ParameterSchema::empty().param(ParamSpec::optional("event_type", ParamKind::String, "type"))
        }
        async fn execute(&self, _arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::new(json!([])))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(NamedTool("find_goals")));
        registry.register(Box::new(NamedTool("find_events")));
        registry
    }

    #[test]
    fn strips_reasoning_blocks() {
        assert_eq!(strip_reasoning("<think>hmm\nok</think>\nAction: find_goals"), "Action: find_goals");
        assert_eq!(strip_reasoning("Answer here <think>never closed"), "Answer here");
        assert_eq!(strip_reasoning("leaked reasoning</think>Final Answer: 1-0"), "Final Answer: 1-0");
    }

    #[test]
    fn final_answer_requires_text() {
        assert_eq!(
            extract_final_answer("Thought: done.\nFinal Answer: Messi scored in the 23rd minute.").as_deref(),
            Some("Messi scored in the 23rd minute.")
        );
        assert_eq!(extract_final_answer("**Final Answer:** 2-1").as_deref(), Some("2-1"));
        assert_eq!(extract_final_answer("final answer:   \n"), None);
        assert_eq!(extract_final_answer("No marker here"), None);
    }

    #[test]
    fn answer_marker_is_stripped_only_when_leading() {
        assert_eq!(strip_answer_marker("Final Answer: Messi scored."), "Messi scored.");
        assert_eq!(strip_answer_marker("**Final Answer:** 2-1 to Barcelona"), "2-1 to Barcelona");
        assert_eq!(strip_answer_marker("  Barcelona won 2-1.  "), "Barcelona won 2-1.");
    }

    #[test]
    fn react_lines() {
        let action = parse_action(
            "Thought: I need the goals.\nAction: find_goals\nAction Input: {}",
            &registry(),
        )
        .unwrap();
        assert_eq!(action.tool, "find_goals");
        assert!(action.arguments.is_empty());

        let action = parse_action(
            "**Action:** `Find-Events`\n**Action Input:**\n```json\n{\"event_type\": \"Shot\"}\n```",
            &registry(),
        )
        .unwrap();
        assert_eq!(action.tool, "find_events");
        assert_eq!(action.arguments["event_type"], json!("Shot"));
    }

    #[test]
    fn missing_or_none_input_is_empty() {
        let action = parse_action("Action: find_goals", &registry()).unwrap();
        assert!(action.arguments.is_empty());
        let action = parse_action("Action: find_goals\nAction Input: None", &registry()).unwrap();
        assert!(action.arguments.is_empty());
    }

    #[test]
    fn function_call_style() {
        let action = parse_action(
            "Action: find_events(event_type=\"Shot\", limit=5)",
            &registry(),
        )
        .unwrap();
        assert_eq!(action.tool, "find_events");
        assert_eq!(action.arguments["event_type"], json!("Shot"));
        assert_eq!(action.arguments["limit"], json!(5));

        let action = parse_action("Action: find_goals()", &registry()).unwrap();
        assert!(action.arguments.is_empty());
    }

    #[test]
    fn json_object_fallback() {
        let action = parse_action(
            "```json\n{\"tool\": \"find_events\", \"arguments\": {\"event_type\": \"Pass\"}}\n```",
            &registry(),
        )
        .unwrap();
        assert_eq!(action.tool, "find_events");
        assert_eq!(action.arguments["event_type"], json!("Pass"));

        let action = parse_action("{'action': 'find_goals', 'action_input': None}", &registry()).unwrap();
        assert_eq!(action.tool, "find_goals");
    }

    #[test]
    fn lenient_arguments() {
        let map = parse_object("{event_type: 'Shot', team: Real Madrid, period: 2, open: True,}").unwrap();
        assert_eq!(map["event_type"], json!("Shot"));
        assert_eq!(map["team"], json!("Real Madrid"));
        assert_eq!(map["period"], json!(2));
        assert_eq!(map["open"], json!(true));
    }

    #[test]
    fn partially_quoted_values_are_recovered() {
        let shapes = [
            "{\"event_type\": Shot\"}",
            "{\"event_type\": \"Shot}",
            "{\"event_type\": \"Shot\"",
            "{event_type: 'Shot}",
        ];
        for input in shapes {
            let text = format!("Action: find_events\nAction Input: {input}");
            let action = parse_action(&text, &registry()).unwrap_or_else(|e| panic!("{input}: {e}"));
            assert_eq!(action.arguments["event_type"], json!("Shot"), "{input}");
        }
    }

    #[test]
    fn apostrophes_inside_bare_values() {
        let action = parse_action(
            "Action: find_events\nAction Input: {player: N'Golo Kante, period: 2}",
            &registry(),
        )
        .unwrap();
        assert_eq!(action.arguments["player"], json!("N'Golo Kante"));
        assert_eq!(action.arguments["period"], json!(2));

        let action = parse_action("Action: find_events(player=N'Golo Kante)", &registry()).unwrap();
        assert_eq!(action.arguments["player"], json!("N'Golo Kante"));
    }

    #[test]
    fn tool_name_on_the_line_after_the_marker() {
        let action = parse_action("Action:\nfind_goals\nAction Input: {}", &registry()).unwrap();
        assert_eq!(action.tool, "find_goals");

        let action = parse_action("**Action:**\n`find_events`\n**Action Input:** {\"event_type\": \"Pass\"}", &registry())
            .unwrap();
        assert_eq!(action.tool, "find_events");
        assert_eq!(action.arguments["event_type"], json!("Pass"));

        let err = parse_action("Action:\nAction Input: {}", &registry()).unwrap_err();
        assert_eq!(err, ActionParseError::NoActionFound);
    }

    #[test]
    fn free_text_has_no_action() {
        let err = parse_action("I think Barcelona pressed high all game.", &registry()).unwrap_err();
        assert_eq!(err, ActionParseError::NoActionFound);
        assert_eq!(err.kind(), FailureKind::NoActionFound);

        let err = parse_action("Action: None", &registry()).unwrap_err();
        assert_eq!(err, ActionParseError::NoActionFound);
    }

    #[test]
    fn unknown_tool() {
        let err = parse_action("Action: predict_winner\nAction Input: {}", &registry()).unwrap_err();
        assert_eq!(
            err,
            ActionParseError::UnknownTool {
                name: "predict_winner".into()
            }
        );
        assert_eq!(err.proposed_name(), "predict_winner");
    }

    #[test]
    fn malformed_arguments() {
        let err = parse_action("Action: find_events\nAction Input: {\"event_type\": ", &registry()).unwrap_err();
        assert!(matches!(err, ActionParseError::MalformedArguments { ref tool, .. } if tool == "find_events"));

        let err = parse_action("Action: find_events\nAction Input: shots please", &registry()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedArguments);
    }

    #[test]
    fn reflection_decisions() {
        let r = parse_reflection("Decision: complete\nRationale: The goal data answers the question.");
        assert_eq!(r.decision, Decision::Complete);
        assert!(r.explicit);
        assert_eq!(r.rationale.as_deref(), Some("The goal data answers the question."));

        let r = parse_reflection("**Decision:** CONTINUE");
        assert_eq!(r.decision, Decision::Continue);
        assert!(r.explicit);

        assert_eq!(parse_reflection("complete.").decision, Decision::Complete);
        assert_eq!(parse_reflection("Final Answer: Messi, 23'").decision, Decision::Complete);

        let r = parse_reflection("Action: find_events\nAction Input: {}");
        assert_eq!(r.decision, Decision::Continue);
        assert!(r.explicit);
    }

    #[test]
    fn ambiguous_reflection_defaults_to_continue() {
        let r = parse_reflection("The data is interesting but I am not sure.");
        assert_eq!(r.decision, Decision::Continue);
        assert!(!r.explicit);

        let r = parse_reflection("");
        assert_eq!(r.decision, Decision::Continue);
        assert!(!r.explicit);
    }
}
