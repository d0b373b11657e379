//! Filtered search over match events.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tactico_core::error::ToolError;
use tactico_core::graph::GraphClient;
use tactico_core::tool::{ParamKind, ParamSpec, ParameterSchema, Tool, ToolOutput};

use crate::common::{int_arg, rows_to_value, run_query, str_arg};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

pub struct FindEventsTool {
    graph: Arc<dyn GraphClient>,
}

impl FindEventsTool {
    pub fn new(graph: Arc<dyn GraphClient>) -> Self {
        Self { graph }
    }
}

/// Build the filtered query and its parameters from validated arguments.
fn build_query(args: &Map<String, Value>) -> (String, Map<String, Value>) {
    let mut clauses = Vec::new();
    let mut params = Map::new();

    if let Some(event_type) = str_arg(args, "event_type") {
        clauses.push("toLower(e.type) = toLower($event_type)");
        params.insert("event_type".into(), Value::from(event_type));
    }
    if let Some(outcome) = str_arg(args, "outcome") {
        clauses.push(
            "toLower(coalesce(e.shot_outcome, e.pass_outcome, e.duel_outcome, \
             e.interception_outcome, e.gk_outcome, '')) CONTAINS toLower($outcome)",
        );
        params.insert("outcome".into(), Value::from(outcome));
    }
    if let Some(player) = str_arg(args, "player") {
        clauses.push("toLower(e.player_name) CONTAINS toLower($player)");
        params.insert("player".into(), Value::from(player));
    }
    if let Some(team) = str_arg(args, "team") {
        clauses.push("toLower(e.team_name) CONTAINS toLower($team)");
        params.insert("team".into(), Value::from(team));
    }
    if let Some(period) = int_arg(args, "period") {
        clauses.push("e.period = $period");
        params.insert("period".into(), Value::from(period));
    }
    if let Some(minute) = int_arg(args, "minute") {
        clauses.push("e.minute = $minute");
        params.insert("minute".into(), Value::from(minute));
    }

    let limit = int_arg(args, "limit").unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    params.insert("limit".into(), Value::from(limit));

    let mut cypher = String::from("MATCH (e:Event)\n");
    if !clauses.is_empty() {
        cypher.push_str("WHERE ");
        cypher.push_str(&clauses.join("\n  AND "));
        cypher.push('\n');
    }
    cypher.push_str(
        "RETURN e.id AS event_id, e.type AS type, e.period AS period, e.minute AS minute, \
         e.second AS second, e.team_name AS team, e.player_name AS player, \
         coalesce(e.shot_outcome, e.pass_outcome, e.duel_outcome, e.interception_outcome, e.gk_outcome) AS outcome, \
         e.location_x AS x, e.location_y AS y, e.under_pressure AS under_pressure, \
         e.possession_id AS possession_id\n\
         ORDER BY e.period, e.minute, e.second\n\
         LIMIT $limit",
    );
    (cypher, params)
}

#[async_trait]
impl Tool for FindEventsTool {
    fn name(&self) -> &str {
        "find_events"
    }

    fn description(&self) -> &str {
        "Search match events with optional filters: event_type (e.g. Shot, Pass, Pressure, Foul \
         Committed), outcome (e.g. Goal, Saved, Incomplete), player or team (partial names), \
         period and minute. Returns events in chronological order with their event_id."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::empty()
            .param(ParamSpec::optional("event_type", ParamKind::String, "Event type name, e.g. Shot"))
            .param(ParamSpec::optional("outcome", ParamKind::String, "Outcome name, e.g. Goal"))
            .param(ParamSpec::optional("player", ParamKind::String, "Player name or part of it"))
            .param(ParamSpec::optional("team", ParamKind::String, "Team name or part of it"))
            .param(ParamSpec::optional("period", ParamKind::Integer, "Match period (1 or 2)"))
            .param(ParamSpec::optional("minute", ParamKind::Integer, "Match minute"))
            .param(
                ParamSpec::optional("limit", ParamKind::Integer, "Maximum events to return")
                    .with_default(DEFAULT_LIMIT),
            )
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let (cypher, params) = build_query(&arguments);
        let rows = run_query(&self.graph, self.name(), &cypher, params).await?;
        Ok(ToolOutput::new(rows_to_value(rows)).with_query(cypher))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tactico_graph::ScriptedGraph;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn no_filters_has_no_where_clause() {
        let (cypher, params) = build_query(&Map::new());
        assert!(!cypher.contains("WHERE"));
        assert_eq!(params["limit"], json!(20));
    }

    #[test]
    fn filters_become_parameters() {
        let (cypher, params) = build_query(&args(json!({
            "event_type": "Shot",
            "team": "Barca",
            "period": 2,
            "limit": 500
        })));
        assert!(cypher.contains("toLower(e.type) = toLower($event_type)"));
        assert!(cypher.contains("e.period = $period"));
        assert!(!cypher.contains("$player"));
        assert_eq!(params["event_type"], json!("Shot"));
        assert_eq!(params["team"], json!("Barca"));
        assert_eq!(params["limit"], json!(100));
    }

    #[tokio::test]
    async fn executes_against_graph() {
        let graph = Arc::new(ScriptedGraph::new().on(
            "MATCH (e:Event)",
            vec![json!({"event_id": "s1", "type": "Shot", "minute": 10})],
        ));
        let tool = FindEventsTool::new(graph.clone());
        let output = tool
            .execute(args(json!({"event_type": "Shot", "limit": 5})))
            .await
            .unwrap();
        assert_eq!(output.data.as_array().unwrap().len(), 1);
        assert_eq!(graph.queries()[0].params["limit"], json!(5));
    }
}
