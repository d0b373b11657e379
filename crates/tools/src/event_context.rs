//! The events surrounding one event in its possession chain.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tactico_core::error::ToolError;
use tactico_core::graph::GraphClient;
use tactico_core::tool::{ParamKind, ParamSpec, ParameterSchema, Tool, ToolOutput};

use crate::common::{int_arg, not_found, run_query, str_arg};

const QUERY: &str = "\
MATCH (target:Event {id: $event_id})
OPTIONAL MATCH (pos:Possession)-[:CONTAINS]->(target)
OPTIONAL MATCH (pos)-[:CONTAINS]->(e:Event)
RETURN pos.id AS possession_id, e.id AS event_id, e.type AS type, e.period AS period,
       e.minute AS minute, e.second AS second, e.team_name AS team, e.player_name AS player,
       e.under_pressure AS under_pressure
ORDER BY e.period, e.minute, e.second, e.timestamp";

pub struct EventContextTool {
    graph: Arc<dyn GraphClient>,
}

impl EventContextTool {
    pub fn new(graph: Arc<dyn GraphClient>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl Tool for EventContextTool {
    fn name(&self) -> &str {
        "get_event_context"
    }

    fn description(&self) -> &str {
        "Show what happened around an event: the event itself plus up to `window` events before \
         and after it in the same possession. Use it to understand the sequence leading into or \
         out of a shot, foul or turnover."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::empty()
            .param(ParamSpec::required("event_id", ParamKind::String, "The event to centre on"))
            .param(
                ParamSpec::optional("window", ParamKind::Integer, "Events to include on each side (1-10)")
                    .with_default(3),
            )
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let event_id = str_arg(&arguments, "event_id")
            .ok_or_else(|| ToolError::InvalidArguments("event_id must not be empty".into()))?
            .to_string();
        let window = int_arg(&arguments, "window").unwrap_or(3).clamp(1, 10) as usize;

        let mut params = Map::new();
        params.insert("event_id".into(), Value::from(event_id.as_str()));
        let rows = run_query(&self.graph, self.name(), QUERY, params).await?;

        if rows.is_empty() {
            return Err(not_found(self.name(), format!("event '{event_id}' not found")));
        }
        let possession_id = rows[0].get("possession_id").cloned().unwrap_or(Value::Null);
        if possession_id.is_null() {
            return Err(not_found(
                self.name(),
                format!("event '{event_id}' is not part of a possession"),
            ));
        }

        let events: Vec<Value> = rows
            .into_iter()
            .map(|mut row| {
                row.remove("possession_id");
                Value::Object(row)
            })
            .collect();

        let index = events
            .iter()
            .position(|e| e["event_id"].as_str() == Some(event_id.as_str()))
            .ok_or_else(|| not_found(self.name(), format!("event '{event_id}' missing from its possession")))?;

        let start = index.saturating_sub(window);
        let end = (index + 1 + window).min(events.len());
        let data = json!({
            "event_id": event_id,
            "possession_id": possession_id,
            "before": events[start..index].to_vec(),
            "event": events[index].clone(),
            "after": events[index + 1..end].to_vec(),
        });
        Ok(ToolOutput::new(data).with_query(QUERY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactico_graph::ScriptedGraph;

    fn chain(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| json!({"possession_id": 7, "event_id": format!("e{i}"), "type": "Pass", "minute": i}))
            .collect()
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn window_is_centred_on_event() {
        let graph = Arc::new(ScriptedGraph::new().on("CONTAINS", chain(10)));
        let tool = EventContextTool::new(graph);
        let output = tool
            .execute(args(json!({"event_id": "e5", "window": 2})))
            .await
            .unwrap();
        assert_eq!(output.data["event"]["event_id"], json!("e5"));
        assert_eq!(output.data["before"].as_array().unwrap().len(), 2);
        assert_eq!(output.data["before"][0]["event_id"], json!("e3"));
        assert_eq!(output.data["after"][1]["event_id"], json!("e7"));
        assert!(output.data["event"].get("possession_id").is_none());
    }

    #[tokio::test]
    async fn window_is_clipped_at_chain_edges() {
        let graph = Arc::new(ScriptedGraph::new().on("CONTAINS", chain(3)));
        let tool = EventContextTool::new(graph);
        let output = tool
            .execute(args(json!({"event_id": "e0", "window": 3})))
            .await
            .unwrap();
        assert!(output.data["before"].as_array().unwrap().is_empty());
        assert_eq!(output.data["after"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_event_fails() {
        let tool = EventContextTool::new(Arc::new(ScriptedGraph::new()));
        let err = tool.execute(args(json!({"event_id": "nope", "window": 3}))).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn event_without_possession_fails() {
        let graph = ScriptedGraph::new().on("CONTAINS", vec![json!({"possession_id": null, "event_id": null})]);
        let tool = EventContextTool::new(Arc::new(graph));
        let err = tool.execute(args(json!({"event_id": "x"}))).await.unwrap_err();
        assert!(err.to_string().contains("not part of a possession"));
    }
}
