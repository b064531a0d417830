//! Neo4j HTTP transactional endpoint client.
//!
//! Each statement is posted to `{uri}/db/{database}/tx/commit`, which opens,
//! runs and commits a transaction in one request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use biokg_core::StoreConfig;

use super::cypher::{CypherExecutor, Row};
use super::StoreOperation;
use crate::error::{GraphError, GraphResult};

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    statements: [Statement<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<ServerError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<DataRow>,
}

#[derive(Debug, Deserialize)]
struct DataRow {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    code: String,
    message: String,
}

/// [`CypherExecutor`] over HTTP with optional basic auth.
#[derive(Debug, Clone)]
pub struct HttpCypherClient {
    client: Client,
    base_uri: String,
    endpoint: String,
    user: Option<String>,
    password: Option<String>,
}

impl HttpCypherClient {
    pub fn new(config: &StoreConfig) -> GraphResult<Self> {
        let base_uri = config.uri.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GraphError::Connection {
                uri: base_uri.clone(),
                message: e.to_string(),
            })?;
        let endpoint = format!("{}/db/{}/tx/commit", base_uri, config.database);
        Ok(Self {
            client,
            base_uri,
            endpoint,
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    /// Full URL statements are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connection_error(&self, e: reqwest::Error) -> GraphError {
        GraphError::Connection {
            uri: self.base_uri.clone(),
            message: e.to_string(),
        }
    }
}

/// Turn a decoded commit response into rows, or the first server error.
fn into_rows(operation: StoreOperation, response: CommitResponse) -> GraphResult<Vec<Row>> {
    if let Some(error) = response.errors.into_iter().next() {
        return Err(GraphError::QueryFailed {
            operation,
            code: error.code,
            message: error.message,
        });
    }
    let result = match response.results.into_iter().next() {
        Some(result) => result,
        None => return Ok(Vec::new()),
    };
    result
        .data
        .into_iter()
        .map(|data| {
            if data.row.len() != result.columns.len() {
                return Err(GraphError::UnexpectedResponse {
                    operation,
                    details: format!(
                        "row has {} values for {} columns",
                        data.row.len(),
                        result.columns.len()
                    ),
                });
            }
            Ok(result.columns.iter().cloned().zip(data.row).collect())
        })
        .collect()
}

#[async_trait]
impl CypherExecutor for HttpCypherClient {
    async fn run(
        &self,
        operation: StoreOperation,
        query: &str,
        params: Map<String, Value>,
    ) -> GraphResult<Vec<Row>> {
        let body = CommitRequest {
            statements: [Statement {
                statement: query,
                parameters: params,
            }],
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(user) = &self.user {
            request = request.basic_auth(user, self.password.as_deref());
        }

        let response = request.send().await.map_err(|e| self.connection_error(e))?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(GraphError::Connection {
                uri: self.base_uri.clone(),
                message: format!("authentication rejected ({})", status),
            });
        }
        if !status.is_success() {
            warn!(%operation, %status, "store returned non-success status");
            return Err(GraphError::QueryFailed {
                operation,
                code: format!("HTTP {}", status.as_u16()),
                message: failure_message(response.text().await),
            });
        }

        let decoded: CommitResponse = response.json().await.map_err(|e| {
            GraphError::UnexpectedResponse {
                operation,
                details: e.to_string(),
            }
        })?;
        let rows = into_rows(operation, decoded)?;
        debug!(%operation, rows = rows.len(), "statement committed");
        Ok(rows)
    }
}

/// Body of a non-success response, or why it could not be read.
fn failure_message<E: std::fmt::Display>(body: Result<String, E>) -> String {
    match body {
        Ok(body) => body,
        Err(e) => format!("response body unreadable: {}", e),
    }
}
