//! Types shared by ingestion client implementations.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::ingest::{RequestKind, StepReport};

/// Transport-level failures. HTTP status codes are not errors at this layer;
/// they are returned in [`ApiReply`] for the caller to interpret.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Raw answer from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Errors decoding a 200 response body.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no id found in response")]
    MissingId,
}

/// Body of a successful submit: `{"id": "<opaque string>"}`.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    id: String,
}

/// Extract the job id from a submit response body.
pub fn parse_submit_body(body: &str) -> Result<String, ResponseError> {
    let response: SubmitResponse = serde_json::from_str(body)?;
    if response.id.is_empty() {
        return Err(ResponseError::MissingId);
    }
    Ok(response.id)
}

/// Decode a status response body into its step reports.
pub fn parse_status_body(body: &str) -> Result<Vec<StepReport>, ResponseError> {
    Ok(serde_json::from_str(body)?)
}

/// The two operations the pipeline performs against the service.
///
/// Implementations must be safe to share across many concurrent tasks.
#[async_trait]
pub trait IngestClient: Send + Sync {
    /// POST a CSV body to the endpoint for `kind`.
    async fn submit(&self, kind: RequestKind, body: Vec<u8>) -> Result<ApiReply, ClientError>;

    /// GET the processing status of a previously submitted job.
    async fn status(&self, job_id: &str) -> Result<ApiReply, ClientError>;
}
