//! Pressing intensity per team for one period.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tactico_core::error::ToolError;
use tactico_core::graph::GraphClient;
use tactico_core::tool::{ParamKind, ParamSpec, ParameterSchema, Tool, ToolOutput};

use crate::common::{as_f64, int_arg, percent, round2, run_query};

// Event coordinates are normalized so every team attacks towards x = 120;
// x >= 80 is the attacking third.
const QUERY: &str = "\
MATCH (e:Event {type: 'Pressure'})
WHERE e.period = $period
RETURN e.team_name AS team, count(e) AS pressure_events,
       avg(e.pressure_duration) AS avg_duration,
       sum(CASE WHEN e.location_x >= 80 THEN 1 ELSE 0 END) AS high_presses
ORDER BY pressure_events DESC";

pub struct PressingIntensityTool {
    graph: Arc<dyn GraphClient>,
}

impl PressingIntensityTool {
    pub fn new(graph: Arc<dyn GraphClient>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl Tool for PressingIntensityTool {
    fn name(&self) -> &str {
        "get_pressing_intensity"
    }

    fn description(&self) -> &str {
        "Measure how aggressively each team pressed in a period: pressure events, share of all \
         pressures, presses in the attacking third and average pressure duration. More pressure \
         events means a higher, more aggressive press; fewer means a deeper block."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::empty().param(
            ParamSpec::optional("period", ParamKind::Integer, "Match period: 1 first half, 2 second half")
                .with_default(1),
        )
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let period = int_arg(&arguments, "period").unwrap_or(1);
        let mut params = Map::new();
        params.insert("period".into(), Value::from(period));
        let rows = run_query(&self.graph, self.name(), QUERY, params).await?;

        let total: f64 = rows
            .iter()
            .filter_map(|r| as_f64(r.get("pressure_events")))
            .sum();
        let teams: Vec<Value> = rows
            .iter()
            .map(|r| {
                let events = as_f64(r.get("pressure_events")).unwrap_or(0.0);
                let high = as_f64(r.get("high_presses")).unwrap_or(0.0);
                json!({
                    "team": r.get("team").cloned().unwrap_or(Value::Null),
                    "pressure_events": events as i64,
                    "share_percent": percent(events, total),
                    "high_presses": high as i64,
                    "high_press_percent": percent(high, events),
                    "avg_duration_secs": as_f64(r.get("avg_duration")).map(round2),
                })
            })
            .collect();

        Ok(ToolOutput::new(json!({ "period": period, "teams": teams })).with_query(QUERY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactico_graph::ScriptedGraph;

    #[tokio::test]
    async fn computes_shares() {
        let graph = Arc::new(ScriptedGraph::new().on(
            "Pressure",
            vec![
                json!({"team": "Barcelona", "pressure_events": 60, "avg_duration": 0.512, "high_presses": 30}),
                json!({"team": "Real Madrid", "pressure_events": 40, "avg_duration": 0.7, "high_presses": 8}),
            ],
        ));
        let tool = PressingIntensityTool::new(graph.clone());
        let output = tool.execute(Map::new()).await.unwrap();

        assert_eq!(output.data["period"], json!(1));
        assert_eq!(output.data["teams"][0]["share_percent"], json!(60.0));
        assert_eq!(output.data["teams"][0]["high_press_percent"], json!(50.0));
        assert_eq!(output.data["teams"][0]["avg_duration_secs"], json!(0.51));
        assert_eq!(output.data["teams"][1]["pressure_events"], json!(40));
        assert_eq!(graph.queries()[0].params["period"], json!(1));
    }

    #[tokio::test]
    async fn no_pressures_gives_empty_teams() {
        let tool = PressingIntensityTool::new(Arc::new(ScriptedGraph::new()));
        let mut args = Map::new();
        args.insert("period".into(), json!(2));
        let output = tool.execute(args).await.unwrap();
        assert_eq!(output.data["period"], json!(2));
        assert_eq!(output.data["teams"], json!([]));
    }
}
