//! Goals scored in the match.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tactico_core::error::ToolError;
use tactico_core::graph::GraphClient;
use tactico_core::tool::{ParameterSchema, Tool, ToolOutput};

use crate::common::{rows_to_value, run_query};

const QUERY: &str = "\
MATCH (e:Event {type: 'Shot'})
WHERE e.shot_outcome = 'Goal'
RETURN e.id AS event_id, e.period AS period, e.minute AS minute, e.second AS second,
       e.player_name AS scorer, e.team_name AS team, e.shot_xg AS xg,
       e.shot_body_part_name AS body_part, e.possession_id AS possession_id
ORDER BY e.period, e.minute, e.second";

pub struct FindGoalsTool {
    graph: Arc<dyn GraphClient>,
}

impl FindGoalsTool {
    pub fn new(graph: Arc<dyn GraphClient>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl Tool for FindGoalsTool {
    fn name(&self) -> &str {
        "find_goals"
    }

    fn description(&self) -> &str {
        "Find every goal in the match in chronological order. Returns event_id, period, minute, \
         second, scorer, team, xg and possession_id. Use it for questions about goals, scorers \
         or key moments, and to get an event_id for deeper analysis."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::empty()
    }

    async fn execute(&self, _arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let rows = run_query(&self.graph, self.name(), QUERY, Map::new()).await?;
        Ok(ToolOutput::new(rows_to_value(rows)).with_query(QUERY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tactico_core::error::GraphError;
    use tactico_graph::ScriptedGraph;

    #[tokio::test]
    async fn returns_goal_records() {
        let graph = Arc::new(ScriptedGraph::new().on(
            "shot_outcome = 'Goal'",
            vec![json!({"event_id": "g1", "period": 1, "minute": 23, "scorer": "Lionel Messi", "team": "Barcelona"})],
        ));
        let tool = FindGoalsTool::new(graph.clone());
        let output = tool.execute(Map::new()).await.unwrap();
        assert_eq!(output.data[0]["event_id"], json!("g1"));
        assert_eq!(output.data[0]["minute"], json!(23));
        assert!(output.query.unwrap().contains("ORDER BY"));
        assert_eq!(graph.queries().len(), 1);
    }

    #[tokio::test]
    async fn no_goals_is_empty_list() {
        let tool = FindGoalsTool::new(Arc::new(ScriptedGraph::new()));
        let output = tool.execute(Map::new()).await.unwrap();
        assert_eq!(output.data, json!([]));
    }

    #[tokio::test]
    async fn graph_error_becomes_execution_failure() {
        let graph = ScriptedGraph::new().failing("Shot", GraphError::Connection("refused".into()));
        let tool = FindGoalsTool::new(Arc::new(graph));
        let err = tool.execute(Map::new()).await.unwrap_err();
        assert_eq!(err.kind(), "execution_failed");
        assert!(err.to_string().contains("refused"));
    }
}
