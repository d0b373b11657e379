//! Neo4j client over the transactional HTTP endpoint.
//!
//! Each query is sent as a single auto-committed statement to
//! `POST {uri}/db/{database}/tx/commit`. Records come back column-major
//! (`columns` + `data[].row`) and are zipped into [`Row`] maps.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tactico_config::GraphConfig;
use tactico_core::error::GraphError;
use tactico_core::graph::{GraphClient, Row};
use tracing::{debug, warn};

pub struct Neo4jHttpClient {
    endpoint: String,
    user: String,
    password: Option<String>,
    client: reqwest::Client,
}

impl Neo4jHttpClient {
    pub fn new(
        uri: &str,
        database: &str,
        user: impl Into<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: format!("{}/db/{}/tx/commit", uri.trim_end_matches('/'), database),
            user: user.into(),
            password,
            client,
        }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(
            &config.uri,
            &config.database,
            config.user.clone(),
            config.password.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GraphClient for Neo4jHttpClient {
    async fn query(&self, cypher: &str, params: Map<String, Value>) -> Result<Vec<Row>, GraphError> {
        let body = serde_json::json!({
            "statements": [{ "statement": cypher, "parameters": params }]
        });

        debug!(endpoint = %self.endpoint, "Running graph query");

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, self.password.as_deref())
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(GraphError::Authentication);
        }
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status, body = %text, "Graph endpoint returned error");
            return Err(GraphError::Connection(format!("HTTP {status}: {text}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| GraphError::Decode(e.to_string()))?;
        decode_response(payload)
    }
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRecord>,
}

#[derive(Debug, Deserialize)]
struct TxRecord {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Zip a transactional-endpoint response into rows keyed by column name.
pub fn decode_response(payload: Value) -> Result<Vec<Row>, GraphError> {
    let response: TxResponse =
        serde_json::from_value(payload).map_err(|e| GraphError::Decode(e.to_string()))?;

    if let Some(error) = response.errors.into_iter().next() {
        return Err(GraphError::Query {
            code: error.code,
            message: error.message,
        });
    }

    let Some(result) = response.results.into_iter().next() else {
        return Ok(Vec::new());
    };

    result
        .data
        .into_iter()
        .map(|record| {
            if record.row.len() != result.columns.len() {
                return Err(GraphError::Decode(format!(
                    "row has {} values for {} columns",
                    record.row.len(),
                    result.columns.len()
                )));
            }
            Ok(result.columns.iter().cloned().zip(record.row).collect())
        })
        .collect()
}
