//! CrateDB session over the HTTP `_sql` endpoint.
//!
//! Statements are POSTed as JSON; batched inserts use the endpoint's
//! `bulk_args` form, one args array per row. Each ingestion task owns its
//! session for the task's lifetime.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::coerce::TypedRow;
use crate::config::DatabaseConfig;
use crate::error::LoadError;

/// Rowcount CrateDB reports for a row that failed within a bulk operation.
const BULK_ROW_FAILED: i64 = -2;

/// Failure to run a statement, split by where the fault lies.
#[derive(Debug, Error)]
pub enum SqlError {
    /// The server received the statement and rejected it.
    #[error("{0}")]
    Rejected(String),
    /// The server could not be reached or the exchange broke down.
    #[error("{0}")]
    Transport(String),
}

/// Seam between the ingestion engine and the store.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Runs a single statement (DDL).
    async fn execute(&self, stmt: &str) -> Result<(), SqlError>;

    /// Runs one parameterized statement against every row in `rows`.
    async fn execute_bulk(&self, stmt: &str, rows: &[TypedRow]) -> Result<(), SqlError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Deserialize)]
struct BulkResponse {
    results: Vec<BulkResult>,
}

#[derive(Deserialize)]
struct BulkResult {
    rowcount: i64,
}

/// An open session against one CrateDB HTTP endpoint.
pub struct CrateSession {
    client: reqwest::Client,
    endpoint: String,
    user: String,
    password: String,
}

impl CrateSession {
    /// Builds a session from resolved connection settings.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LoadError::Session(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    async fn post(&self, body: serde_json::Value) -> Result<reqwest::Response, SqlError> {
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| SqlError::Transport(format!("request to {} failed: {}", self.endpoint, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => format!("HTTP {}", status),
            };
            return Err(SqlError::Rejected(message));
        }

        Ok(response)
    }
}

#[async_trait]
impl SqlExecutor for CrateSession {
    async fn execute(&self, stmt: &str) -> Result<(), SqlError> {
        debug!(stmt, "executing statement");
        self.post(json!({ "stmt": stmt })).await?;
        Ok(())
    }

    async fn execute_bulk(&self, stmt: &str, rows: &[TypedRow]) -> Result<(), SqlError> {
        debug!(rows = rows.len(), "executing bulk insert");
        let response = self
            .post(json!({ "stmt": stmt, "bulk_args": rows }))
            .await?;

        let body: BulkResponse = response
            .json()
            .await
            .map_err(|e| SqlError::Transport(format!("unreadable bulk response: {}", e)))?;

        if let Some(index) = body
            .results
            .iter()
            .position(|r| r.rowcount == BULK_ROW_FAILED)
        {
            return Err(SqlError::Rejected(format!(
                "bulk insert rejected at row {} of the batch",
                index
            )));
        }

        Ok(())
    }
}
