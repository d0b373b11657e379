//! Match-analysis tools for Tactico.
//!
//! Each tool runs parameterized Cypher through a [`GraphClient`] against the
//! ingested match graph:
//!
//! - `(:Team {id, name, formation})`, `(:Player)-[:PLAYS_FOR]->(:Team)`
//! - `(:Possession {id, team_id})-[:CONTAINS]->(:Event)`
//! - `(:Event {id, type, period, minute, second, team_name, player_name, ...})-[:NEXT]->(:Event)`
//!
//! Data-layer failures surface as `ToolError::ExecutionFailed`.

mod common;
pub mod event_context;
pub mod find_events;
pub mod find_goals;
pub mod possession_before;
pub mod possession_stats;
pub mod pressing;
pub mod team_formation;

use std::sync::Arc;

use tactico_core::graph::GraphClient;
use tactico_core::tool::ToolRegistry;

pub use event_context::EventContextTool;
pub use find_events::FindEventsTool;
pub use find_goals::FindGoalsTool;
pub use possession_before::PossessionBeforeEventTool;
pub use possession_stats::PossessionStatsTool;
pub use pressing::PressingIntensityTool;
pub use team_formation::TeamFormationTool;

/// Create the registry of all match tools, backed by `graph`.
pub fn match_registry(graph: Arc<dyn GraphClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(FindGoalsTool::new(graph.clone())));
    registry.register(Box::new(FindEventsTool::new(graph.clone())));
    registry.register(Box::new(EventContextTool::new(graph.clone())));
    registry.register(Box::new(PossessionBeforeEventTool::new(graph.clone())));
    registry.register(Box::new(TeamFormationTool::new(graph.clone())));
    registry.register(Box::new(PressingIntensityTool::new(graph.clone())));
    registry.register(Box::new(PossessionStatsTool::new(graph)));
    registry
}
