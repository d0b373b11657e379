//! Tool trait and the capability registry.
//!
//! Tools are the agent's only way to look at match data. Each tool declares
//! a typed parameter schema; the registry validates model-proposed arguments
//! against it before anything is executed, so a tool's `execute` only ever
//! sees arguments of the declared types (with defaults filled in).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ToolError;

/// The JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
        }
    }

    /// Accept `value` as this kind, coercing quoted scalars (`"45"` for an
    /// integer, `"true"` for a boolean). Returns `None` on a real mismatch.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ParamKind::String, Value::String(_)) => Some(value.clone()),
            (ParamKind::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (ParamKind::Integer, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::from(i))
                } else {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0)
                        .map(|f| Value::from(f as i64))
                }
            }
            (ParamKind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (ParamKind::Number, Value::Number(_)) => Some(value.clone()),
            (ParamKind::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            (ParamKind::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ParamKind::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(Value::Bool(true)),
                "false" | "no" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Declaration of a single tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
            default: None,
        }
    }

    /// Attach a default, which also makes the parameter optional.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self.required = false;
        self
    }
}

/// Ordered parameter declarations for one tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub params: Vec<ParamSpec>,
}

impl ParameterSchema {
    /// A schema for a tool that takes no parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Compact call signature, e.g. `find_events(event_type?: string, limit?: integer = 20)`.
    pub fn signature(&self, tool_name: &str) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let mut s = format!(
                    "{}{}: {}",
                    p.name,
                    if p.required { "" } else { "?" },
                    p.kind.as_str()
                );
                if let Some(default) = &p.default {
                    s.push_str(&format!(" = {default}"));
                }
                s
            })
            .collect();
        format!("{}({})", tool_name, params.join(", "))
    }

    /// Render as a JSON Schema object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            let mut prop = Map::new();
            prop.insert("type".into(), Value::String(p.kind.as_str().into()));
            prop.insert("description".into(), Value::String(p.description.clone()));
            if let Some(default) = &p.default {
                prop.insert("default".into(), default.clone());
            }
            properties.insert(p.name.clone(), Value::Object(prop));
        }
        let required: Vec<Value> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| Value::String(p.name.clone()))
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validate `arguments` against this schema.
    ///
    /// Returns the normalized argument map: values coerced to their declared
    /// kinds, explicit nulls dropped, and defaults filled in.
    pub fn validate(&self, tool_name: &str, arguments: &Map<String, Value>) -> Result<Map<String, Value>, ToolError> {
        if let Some(unexpected) = arguments.keys().find(|k| self.get(k).is_none()) {
            return Err(ToolError::UnexpectedParameter {
                tool_name: tool_name.to_string(),
                parameter: unexpected.clone(),
            });
        }

        let mut validated = Map::new();
        for spec in &self.params {
            match arguments.get(&spec.name) {
                None | Some(Value::Null) => {
                    if let Some(default) = &spec.default {
                        validated.insert(spec.name.clone(), default.clone());
                    } else if spec.required {
                        return Err(ToolError::MissingParameter {
                            tool_name: tool_name.to_string(),
                            parameter: spec.name.clone(),
                        });
                    }
                }
                Some(value) => {
                    let coerced = spec.kind.coerce(value).ok_or_else(|| ToolError::TypeMismatch {
                        tool_name: tool_name.to_string(),
                        parameter: spec.name.clone(),
                        expected: spec.kind.as_str().to_string(),
                        found: json_type_name(value).to_string(),
                    })?;
                    validated.insert(spec.name.clone(), coerced);
                }
            }
        }
        Ok(validated)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The structured payload produced by a successful tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// A JSON object, or an array of JSON objects (one per record)
    pub data: Value,

    /// The query that produced the data, for debugging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl ToolOutput {
    pub fn new(data: Value) -> Self {
        Self { data, query: None }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

/// Static metadata describing a tool, as listed by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

/// The core Tool trait.
///
/// Each match query (goals, event search, pressing, ...) implements this
/// trait and is registered in the [`ToolRegistry`] at startup.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "find_goals").
    fn name(&self) -> &str;

    /// When to use the tool and what it returns (sent to the LLM).
    fn description(&self) -> &str;

    /// Declared parameters.
    fn parameters(&self) -> ParameterSchema;

    /// Execute the tool with already-validated arguments.
    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Normalize a model-written tool name for registry lookup.
///
/// `" `Find-Goals()` "` becomes `"find_goals"`.
pub fn normalize_tool_name(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '`' | '"' | '\'' | '*' | '.' | ':' | '[' | ']'))
        .trim();
    let trimmed = trimmed.strip_suffix("()").unwrap_or(trimmed).trim();
    trimmed
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// The fixed set of tools available to the agent.
///
/// Tools are kept in registration order so rendered descriptions are
/// deterministic.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    /// Get a tool by exact name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Look a tool up by a model-written name, tolerating case, quoting and
    /// whitespace variations.
    pub fn resolve(&self, name: &str) -> Option<&dyn Tool> {
        self.get(name).or_else(|| {
            let normalized = normalize_tool_name(name);
            self.tools
                .iter()
                .find(|t| normalize_tool_name(t.name()) == normalized)
                .map(|t| t.as_ref())
        })
    }

    /// Descriptors for every registered tool.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate arguments for the named tool without executing it.
    ///
    /// Returns the canonical tool name and the normalized arguments.
    pub fn validate(&self, name: &str, arguments: &Map<String, Value>) -> Result<(String, Map<String, Value>), ToolError> {
        let tool = self
            .resolve(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        let validated = tool.parameters().validate(tool.name(), arguments)?;
        Ok((tool.name().to_string(), validated))
    }

    /// Validate and execute a tool call.
    pub async fn invoke(&self, name: &str, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let tool = self
            .resolve(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        let validated = tool.parameters().validate(tool.name(), arguments)?;
        tracing::debug!(tool = tool.name(), "Invoking tool");
        tool.execute(validated).await
    }

    /// Render every tool's signature, description and parameters for a prompt.
    pub fn render_descriptions(&self) -> String {
        let mut out = String::new();
        for tool in &self.tools {
            let schema = tool.parameters();
            out.push_str(&format!("- {}\n", schema.signature(tool.name())));
            out.push_str(&format!("  {}\n", tool.description()));
            for p in &schema.params {
                out.push_str(&format!(
                    "    {} ({}, {}): {}\n",
                    p.name,
                    p.kind.as_str(),
                    if p.required { "required" } else { "optional" },
                    p.description
                ));
            }
        }
        out
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A simple test tool for unit tests.
    struct EchoMinuteTool;

    #[async_trait]
    impl Tool for EchoMinuteTool {
        fn name(&self) -> &str {
            "echo_minute"
        }
        fn description(&self) -> &str {
            "Echoes back the minute and period"
        }
        fn parameters(&self) -> ParameterSchema {
            ParameterSchema::empty()
                .param(ParamSpec::required("minute", ParamKind::Integer, "Match minute"))
                .param(ParamSpec::optional("period", ParamKind::Integer, "Match period").with_default(1))
                .param(ParamSpec::optional("team", ParamKind::String, "Team name"))
        }
        async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::new(Value::Object(arguments)))
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoMinuteTool));
        registry
    }

    #[test]
    fn registry_register_and_lookup() {
        let registry = registry();
        assert!(registry.get("echo_minute").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = registry();
        registry.register(Box::new(EchoMinuteTool));
        assert_eq!(registry.names(), vec!["echo_minute"]);
    }

    #[test]
    fn resolve_normalizes_names() {
        let registry = registry();
        assert!(registry.resolve("Echo Minute").is_some());
        assert!(registry.resolve(" `echo-minute()` ").is_some());
        assert!(registry.resolve("ECHO_MINUTE").is_some());
        assert!(registry.resolve("echo").is_none());
    }

    #[test]
    fn normalize_strips_decoration() {
        assert_eq!(normalize_tool_name("**find_goals**"), "find_goals");
        assert_eq!(normalize_tool_name("\"Find Goals\""), "find_goals");
        assert_eq!(normalize_tool_name("get-event-context()"), "get_event_context");
    }

    #[test]
    fn validate_fills_defaults_and_coerces() {
        let registry = registry();
        let (name, validated) = registry
            .validate("echo_minute", &args(json!({"minute": "45"})))
            .unwrap();
        assert_eq!(name, "echo_minute");
        assert_eq!(validated["minute"], json!(45));
        assert_eq!(validated["period"], json!(1));
        assert!(!validated.contains_key("team"));
    }

    #[test]
    fn validate_missing_parameter() {
        let registry = registry();
        let err = registry.validate("echo_minute", &Map::new()).unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter { ref parameter, .. } if parameter == "minute"));
    }

    #[test]
    fn validate_null_counts_as_missing() {
        let registry = registry();
        let err = registry
            .validate("echo_minute", &args(json!({"minute": null})))
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter { .. }));
    }

    #[test]
    fn validate_type_mismatch() {
        let registry = registry();
        let err = registry
            .validate("echo_minute", &args(json!({"minute": "late"})))
            .unwrap_err();
        match err {
            ToolError::TypeMismatch { expected, found, .. } => {
                assert_eq!(expected, "integer");
                assert_eq!(found, "string");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn validate_unexpected_parameter() {
        let registry = registry();
        let err = registry
            .validate("echo_minute", &args(json!({"minute": 3, "event_id": "abc"})))
            .unwrap_err();
        assert!(matches!(err, ToolError::UnexpectedParameter { ref parameter, .. } if parameter == "event_id"));
    }

    #[test]
    fn coerce_rules() {
        assert_eq!(ParamKind::Integer.coerce(&json!(12.0)), Some(json!(12)));
        assert_eq!(ParamKind::Integer.coerce(&json!(12.5)), None);
        assert_eq!(ParamKind::Boolean.coerce(&json!("True")), Some(json!(true)));
        assert_eq!(ParamKind::String.coerce(&json!(217)), Some(json!("217")));
        assert_eq!(ParamKind::Number.coerce(&json!("0.35")), Some(json!(0.35)));
        assert_eq!(ParamKind::String.coerce(&json!(["a"])), None);
    }

    #[test]
    fn signature_and_json_schema() {
        let schema = EchoMinuteTool.parameters();
        assert_eq!(
            schema.signature("echo_minute"),
            "echo_minute(minute: integer, period?: integer = 1, team?: string)"
        );
        let json = schema.to_json_schema();
        assert_eq!(json["required"], json!(["minute"]));
        assert_eq!(json["properties"]["period"]["default"], json!(1));
    }

    #[test]
    fn render_descriptions_lists_params() {
        let rendered = registry().render_descriptions();
        assert!(rendered.starts_with("- echo_minute(minute: integer"));
        assert!(rendered.contains("Echoes back the minute"));
        assert!(rendered.contains("minute (integer, required): Match minute"));
    }

    #[tokio::test]
    async fn registry_invoke_tool() {
        let registry = registry();
        let output = registry
            .invoke("Echo Minute", &args(json!({"minute": 12})))
            .await
            .unwrap();
        assert_eq!(output.data["minute"], json!(12));
        assert_eq!(output.data["period"], json!(1));
    }

    #[tokio::test]
    async fn registry_invoke_missing_tool() {
        let registry = ToolRegistry::new();
        let err = registry.invoke("nonexistent", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
