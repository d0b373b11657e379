//! Graph database seam.
//!
//! Tools talk to the match graph only through [`GraphClient`], so they can be
//! exercised against a scripted graph in tests.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::GraphError;

/// One result record, keyed by the column names of the query's `RETURN` clause.
pub type Row = Map<String, Value>;

/// Read-only access to the graph database holding match events.
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Run a parameterized Cypher query and return its records.
    async fn query(&self, cypher: &str, params: Map<String, Value>) -> Result<Vec<Row>, GraphError>;

    /// Connectivity check.
    async fn ping(&self) -> Result<(), GraphError> {
        self.query("RETURN 1 AS ok", Map::new()).await.map(|_| ())
    }
}
