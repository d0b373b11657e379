//! A graph that answers from canned records.
//!
//! Rules are matched in insertion order against the query text; the first
//! rule whose fragment appears in the Cypher wins. Unmatched queries return
//! no rows. Every query is logged so callers can assert on what was run.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tactico_core::error::GraphError;
use tactico_core::graph::{GraphClient, Row};

/// A query that reached the scripted graph.
#[derive(Debug, Clone)]
pub struct RecordedQuery {
    pub cypher: String,
    pub params: Map<String, Value>,
}

#[derive(Default)]
pub struct ScriptedGraph {
    rules: Vec<(String, Result<Vec<Row>, GraphError>)>,
    log: Mutex<Vec<RecordedQuery>>,
}

impl ScriptedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries containing `fragment` with `rows` (JSON objects).
    pub fn on(mut self, fragment: impl Into<String>, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.rules.push((fragment.into(), Ok(rows)));
        self
    }

    /// Fail queries containing `fragment` with `error`.
    pub fn failing(mut self, fragment: impl Into<String>, error: GraphError) -> Self {
        self.rules.push((fragment.into(), Err(error)));
        self
    }

    /// Every query received so far, oldest first.
    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GraphClient for ScriptedGraph {
    async fn query(&self, cypher: &str, params: Map<String, Value>) -> Result<Vec<Row>, GraphError> {
        if let Ok(mut log) = self.log.lock() {
            log.push(RecordedQuery {
                cypher: cypher.to_string(),
                params,
            });
        }

        self.rules
            .iter()
            .find(|(fragment, _)| cypher.contains(fragment.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
