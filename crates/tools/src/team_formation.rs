//! Starting formation and line-up for a team.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tactico_core::error::ToolError;
use tactico_core::graph::GraphClient;
use tactico_core::tool::{ParamKind, ParamSpec, ParameterSchema, Tool, ToolOutput};

use crate::common::{not_found, run_query, str_arg};

const QUERY: &str = "\
MATCH (t:Team)
WHERE toString(t.id) = $team OR toLower(t.name) CONTAINS toLower($team)
OPTIONAL MATCH (p:Player)-[:PLAYS_FOR]->(t)
RETURN t.id AS team_id, t.name AS team, t.formation AS formation,
       collect(CASE WHEN p IS NULL THEN NULL
               ELSE {name: p.name, position: p.position, jersey_number: p.jersey_number} END) AS players
ORDER BY t.name";

/// Render a formation as dashed lines: `433` and `"4-3-3"` both become `"4-3-3"`.
pub fn format_formation(value: &Value) -> Option<String> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if raw.contains('-') {
        return Some(raw);
    }
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(raw.chars().map(String::from).collect::<Vec<_>>().join("-"))
}

pub struct TeamFormationTool {
    graph: Arc<dyn GraphClient>,
}

impl TeamFormationTool {
    pub fn new(graph: Arc<dyn GraphClient>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl Tool for TeamFormationTool {
    fn name(&self) -> &str {
        "get_team_formation"
    }

    fn description(&self) -> &str {
        "Get a team's starting formation (e.g. 4-3-3) and line-up with positions. Accepts the \
         team name (or part of it) or its id. Use it for questions about tactical setup or \
         defensive structure."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::empty().param(ParamSpec::required(
            "team",
            ParamKind::String,
            "Team name, partial name or id",
        ))
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let team = str_arg(&arguments, "team")
            .ok_or_else(|| ToolError::InvalidArguments("team must not be empty".into()))?
            .to_string();

        let mut params = Map::new();
        params.insert("team".into(), Value::from(team.as_str()));
        let rows = run_query(&self.graph, self.name(), QUERY, params).await?;
        if rows.is_empty() {
            return Err(not_found(self.name(), format!("no team matching '{team}'")));
        }

        let teams: Vec<Value> = rows
            .into_iter()
            .map(|mut row| {
                let formation = row.get("formation").and_then(format_formation);
                row.insert("formation".into(), formation.map(Value::from).unwrap_or(Value::Null));
                Value::Object(row)
            })
            .collect();

        // A single match is the common case; keep the observation flat.
        let data = if teams.len() == 1 {
            teams.into_iter().next().unwrap_or(Value::Null)
        } else {
            Value::Array(teams)
        };
        Ok(ToolOutput::new(data).with_query(QUERY))
    }
}
