//! HTTP implementation of the ingestion client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::config::PusherConfig;
use crate::ingest::RequestKind;

use super::{ApiReply, ClientError, IngestClient};

const STATUS_PATH: &str = "/status";

/// NumerX client backed by a single pooled `reqwest::Client`.
#[derive(Clone)]
pub struct NumerxClient {
    client: Client,
    base_url: String,
    credential: String,
}

impl NumerxClient {
    /// Create a client from the uploader configuration.
    pub fn new(config: &PusherConfig) -> Result<Self, ClientError> {
        Self::with_timeout(
            &config.base_url,
            &config.credential,
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn with_timeout(
        base_url: &str,
        credential: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential: credential.to_string(),
        })
    }

    /// Get the base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the submit request for `kind`.
    fn submit_request(&self, kind: RequestKind, body: Vec<u8>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, kind.path());
        self.client
            .post(url)
            .query(&kind.query_params())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "text/csv")
            .header(AUTHORIZATION, &self.credential)
            .body(body)
    }

    /// Build the status request for a job.
    fn status_request(&self, job_id: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, STATUS_PATH);
        self.client
            .get(url)
            .query(&[("id", job_id)])
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, &self.credential)
    }

    async fn execute(request: RequestBuilder) -> Result<ApiReply, ClientError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_transport_error)?;
        Ok(ApiReply { status, body })
    }
}

fn map_transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else if e.is_connect() {
        ClientError::ConnectionFailed(e.to_string())
    } else {
        ClientError::Request(e.to_string())
    }
}

#[async_trait]
impl IngestClient for NumerxClient {
    async fn submit(&self, kind: RequestKind, body: Vec<u8>) -> Result<ApiReply, ClientError> {
        debug!(kind = %kind, bytes = body.len(), "POST {}{}", self.base_url, kind.path());
        let reply = Self::execute(self.submit_request(kind, body)).await?;
        debug!(status = reply.status, body = %reply.body, "Submit response");
        Ok(reply)
    }

    async fn status(&self, job_id: &str) -> Result<ApiReply, ClientError> {
        debug!(job_id, "GET {}{}", self.base_url, STATUS_PATH);
        let reply = Self::execute(self.status_request(job_id)).await?;
        debug!(job_id, status = reply.status, body = %reply.body, "Status response");
        Ok(reply)
    }
}
