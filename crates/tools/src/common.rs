//! Helpers shared by the match tools.

use std::sync::Arc;

use serde_json::{Map, Value};
use tactico_core::error::{GraphError, ToolError};
use tactico_core::graph::{GraphClient, Row};
use tracing::debug;

/// Run `cypher` and map data-layer failures to `ExecutionFailed`.
pub(crate) async fn run_query(
    graph: &Arc<dyn GraphClient>,
    tool_name: &str,
    cypher: &str,
    params: Map<String, Value>,
) -> Result<Vec<Row>, ToolError> {
    let rows = graph
        .query(cypher, params)
        .await
        .map_err(|e| graph_failure(tool_name, e))?;
    debug!(tool = tool_name, rows = rows.len(), "Graph query returned");
    Ok(rows)
}

pub(crate) fn graph_failure(tool_name: &str, err: GraphError) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool_name.to_string(),
        reason: err.to_string(),
    }
}

pub(crate) fn not_found(tool_name: &str, what: impl std::fmt::Display) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool_name.to_string(),
        reason: what.to_string(),
    }
}

pub(crate) fn str_arg<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn int_arg(args: &Map<String, Value>, key: &str) -> Option<i64> {
    args.get(key).and_then(Value::as_i64)
}

pub(crate) fn rows_to_value(rows: Vec<Row>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}

pub(crate) fn as_f64(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

/// Round to two decimals for compact observations.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Percentage of `part` in `whole`, 0 when `whole` is 0.
pub(crate) fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { round2(part / whole * 100.0) } else { 0.0 }
}
