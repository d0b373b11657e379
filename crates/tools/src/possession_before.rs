//! Build-up analysis: the passes of the possession that led to an event.

use std::f64::consts::FRAC_PI_4;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tactico_core::error::ToolError;
use tactico_core::graph::{GraphClient, Row};
use tactico_core::tool::{ParamKind, ParamSpec, ParameterSchema, Tool, ToolOutput};

use crate::common::{as_f64, not_found, percent, round2, run_query, str_arg};

// Passes are restricted to those played before the target event.
const QUERY: &str = "\
MATCH (target:Event {id: $event_id})
OPTIONAL MATCH (pos:Possession)-[:CONTAINS]->(target)
OPTIONAL MATCH (pos)-[:CONTAINS]->(p:Event)
WHERE p.type = 'Pass'
  AND (p.period < target.period
       OR (p.period = target.period AND p.minute * 60 + p.second <= target.minute * 60 + target.second))
RETURN pos.id AS possession_id, target.type AS target_type, target.minute AS target_minute,
       p.id AS pass_id, p.period AS period, p.minute AS minute, p.second AS second,
       p.team_name AS team, p.player_name AS player, p.pass_recipient_name AS recipient,
       p.pass_length AS length, p.pass_angle AS angle, p.pass_outcome AS outcome,
       p.under_pressure AS under_pressure
ORDER BY p.period, p.minute, p.second";

/// One pass in the chain.
#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub player: Option<String>,
    pub recipient: Option<String>,
    pub minute: Option<i64>,
    pub second: Option<i64>,
    pub length: Option<f64>,
    pub direction: Direction,
    pub completed: bool,
    pub under_pressure: bool,
}

/// Direction of a pass relative to the attacking goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Lateral,
    Backward,
    Unknown,
}

impl Direction {
    /// Classify a pass angle in radians (0 points at the opponent's goal).
    pub fn from_angle(angle: Option<f64>) -> Self {
        match angle.map(f64::abs) {
            None => Direction::Unknown,
            Some(a) if a < FRAC_PI_4 => Direction::Forward,
            Some(a) if a <= 3.0 * FRAC_PI_4 => Direction::Lateral,
            Some(_) => Direction::Backward,
        }
    }
}

/// Aggregate metrics over a possession's passes.
#[derive(Debug, Clone, Serialize)]
pub struct PossessionSummary {
    pub pass_count: usize,
    pub completion_rate: f64,
    pub avg_pass_length: f64,
    pub pressured_passes: usize,
    pub direction_pattern: &'static str,
    pub duration_seconds: i64,
    pub notes: Vec<String>,
}

fn pass_from_row(row: &Row) -> PassSummary {
    let text = |key: &str| row.get(key).and_then(Value::as_str).map(String::from);
    PassSummary {
        player: text("player"),
        recipient: text("recipient"),
        minute: row.get("minute").and_then(Value::as_i64),
        second: row.get("second").and_then(Value::as_i64),
        length: as_f64(row.get("length")).map(round2),
        direction: Direction::from_angle(as_f64(row.get("angle"))),
        // the event feed only records an outcome for unsuccessful passes
        completed: row.get("outcome").is_none_or(Value::is_null),
        under_pressure: row.get("under_pressure").and_then(Value::as_bool).unwrap_or(false),
    }
}

/// Compute completion, length, pressure and direction metrics.
pub fn summarize(passes: &[PassSummary]) -> PossessionSummary {
    let count = passes.len();
    let completed = passes.iter().filter(|p| p.completed).count();
    let lengths: Vec<f64> = passes.iter().filter_map(|p| p.length).collect();
    let avg_length = if lengths.is_empty() {
        0.0
    } else {
        round2(lengths.iter().sum::<f64>() / lengths.len() as f64)
    };
    let pressured = passes.iter().filter(|p| p.under_pressure).count();

    let classified: Vec<Direction> = passes
        .iter()
        .map(|p| p.direction)
        .filter(|d| *d != Direction::Unknown)
        .collect();
    let share = |dir: Direction| {
        if classified.is_empty() {
            0.0
        } else {
            classified.iter().filter(|d| **d == dir).count() as f64 / classified.len() as f64
        }
    };
    let direction_pattern = if share(Direction::Forward) >= 0.5 {
        "vertical"
    } else if share(Direction::Lateral) + share(Direction::Backward) >= 0.6 {
        "lateral"
    } else {
        "mixed"
    };

    let seconds = |p: &PassSummary| p.minute.unwrap_or(0) * 60 + p.second.unwrap_or(0);
    let duration_seconds = match (passes.first(), passes.last()) {
        (Some(first), Some(last)) => (seconds(last) - seconds(first)).max(0),
        _ => 0,
    };

    let completion_rate = percent(completed as f64, count as f64);
    let mut notes = Vec::new();
    if count > 0 {
        notes.push(format!("{count} passes, {completion_rate}% completed"));
    } else {
        notes.push("no passes before the event in this possession".to_string());
    }
    if pressured > 0 {
        notes.push(format!("{pressured} passes played under pressure"));
    }
    match direction_pattern {
        "vertical" => notes.push("direct, forward-first build-up".to_string()),
        "lateral" => notes.push("patient build-up through lateral and recycled passes".to_string()),
        _ => {}
    }

    PossessionSummary {
        pass_count: count,
        completion_rate,
        avg_pass_length: avg_length,
        pressured_passes: pressured,
        direction_pattern,
        duration_seconds,
        notes,
    }
}

pub struct PossessionBeforeEventTool {
    graph: Arc<dyn GraphClient>,
}

impl PossessionBeforeEventTool {
    pub fn new(graph: Arc<dyn GraphClient>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl Tool for PossessionBeforeEventTool {
    fn name(&self) -> &str {
        "get_possession_before_event"
    }

    fn description(&self) -> &str {
        "Analyze the build-up to an event (usually a goal or shot): the passes of its possession \
         in order, with completion rate, average pass length, passes under pressure and the \
         direction pattern (vertical, lateral or mixed). Needs an event_id from find_goals or \
         find_events."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::empty().param(ParamSpec::required(
            "event_id",
            ParamKind::String,
            "The event whose build-up to analyze",
        ))
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let event_id = str_arg(&arguments, "event_id")
            .ok_or_else(|| ToolError::InvalidArguments("event_id must not be empty".into()))?
            .to_string();

        let mut params = Map::new();
        params.insert("event_id".into(), Value::from(event_id.as_str()));
        let rows = run_query(&self.graph, self.name(), QUERY, params).await?;

        let Some(first) = rows.first() else {
            return Err(not_found(self.name(), format!("event '{event_id}' not found")));
        };
        let possession_id = first.get("possession_id").cloned().unwrap_or(Value::Null);
        if possession_id.is_null() {
            return Err(not_found(
                self.name(),
                format!("no possession chain found for event '{event_id}'"),
            ));
        }
        let target_type = first.get("target_type").cloned().unwrap_or(Value::Null);
        let team = rows
            .iter()
            .find_map(|r| r.get("team").and_then(Value::as_str))
            .map(String::from);

        let passes: Vec<PassSummary> = rows
            .iter()
            .filter(|r| r.get("pass_id").is_some_and(|v| !v.is_null()))
            .map(pass_from_row)
            .collect();
        let summary = summarize(&passes);

        let data = serde_json::json!({
            "event_id": event_id,
            "event_type": target_type,
            "possession_id": possession_id,
            "team": team,
            "passes": passes,
            "metrics": summary,
        });
        Ok(ToolOutput::new(data).with_query(QUERY))
    }
}
