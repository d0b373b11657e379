//! Passing volume and accuracy per team, a proxy for possession share.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tactico_core::error::ToolError;
use tactico_core::graph::GraphClient;
use tactico_core::tool::{ParamKind, ParamSpec, ParameterSchema, Tool, ToolOutput};

use crate::common::{as_f64, int_arg, percent, round2, run_query};

const QUERY: &str = "\
MATCH (e:Event {type: 'Pass'})
WHERE $period IS NULL OR e.period = $period
RETURN e.team_name AS team, count(e) AS passes,
       sum(CASE WHEN e.pass_outcome IS NULL THEN 1 ELSE 0 END) AS completed,
       avg(e.pass_length) AS avg_pass_length,
       count(DISTINCT e.possession_id) AS possessions
ORDER BY passes DESC";

pub struct PossessionStatsTool {
    graph: Arc<dyn GraphClient>,
}

impl PossessionStatsTool {
    pub fn new(graph: Arc<dyn GraphClient>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl Tool for PossessionStatsTool {
    fn name(&self) -> &str {
        "get_possession_stats"
    }

    fn description(&self) -> &str {
        "Compare the teams' passing: passes attempted and completed, completion rate, share of \
         all passes (a proxy for possession), average pass length and number of possessions. \
         Optionally restrict to one period."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::empty().param(ParamSpec::optional(
            "period",
            ParamKind::Integer,
            "Match period; omit for the whole match",
        ))
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let period = int_arg(&arguments, "period");
        let mut params = Map::new();
        params.insert("period".into(), period.map(Value::from).unwrap_or(Value::Null));
        let rows = run_query(&self.graph, self.name(), QUERY, params).await?;

        let total: f64 = rows.iter().filter_map(|r| as_f64(r.get("passes"))).sum();
        let teams: Vec<Value> = rows
            .iter()
            .map(|r| {
                let passes = as_f64(r.get("passes")).unwrap_or(0.0);
                let completed = as_f64(r.get("completed")).unwrap_or(0.0);
                json!({
                    "team": r.get("team").cloned().unwrap_or(Value::Null),
                    "passes": passes as i64,
                    "completed": completed as i64,
                    "completion_rate": percent(completed, passes),
                    "pass_share_percent": percent(passes, total),
                    "avg_pass_length": as_f64(r.get("avg_pass_length")).map(round2),
                    "possessions": r.get("possessions").cloned().unwrap_or(Value::Null),
                })
            })
            .collect();

        Ok(ToolOutput::new(json!({ "period": period, "teams": teams })).with_query(QUERY))
    }
}
