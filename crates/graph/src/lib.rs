//! Graph database access for Tactico.
//!
//! [`Neo4jHttpClient`] speaks the Neo4j transactional HTTP API. [`ScriptedGraph`]
//! answers queries from canned records and stands in for a live database in
//! tests and offline demos.

pub mod neo4j_http;
pub mod scripted;

pub use neo4j_http::Neo4jHttpClient;
pub use scripted::ScriptedGraph;
