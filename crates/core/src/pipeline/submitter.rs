//! Turns one CSV file into a tracked job or a failed job.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::client::{parse_submit_body, ApiReply, IngestClient};
use crate::ingest::{FailedJob, FailureCause, Job, RequestKind};

use super::config::PipelineConfig;
use super::types::SubmitOutcome;

/// Tag recorded as job id when a 200 response carried no usable id.
pub const PARSE_ERROR_TAG: &str = "parse error";

/// Submits files to the ingestion service, retrying transport failures.
#[derive(Clone)]
pub struct Submitter {
    client: Arc<dyn IngestClient>,
    kind: RequestKind,
    retry_count: u32,
    retry_delay: Duration,
}

impl Submitter {
    pub fn new(client: Arc<dyn IngestClient>, kind: RequestKind, config: &PipelineConfig) -> Self {
        Self {
            client,
            kind,
            retry_count: config.retry_count.max(1),
            retry_delay: config.poll_interval,
        }
    }

    /// Read `path` and POST it, retrying up to the configured attempt count.
    ///
    /// Only transport failures are retried. Any HTTP answer ends the loop.
    pub async fn submit(&self, path: &Path) -> SubmitOutcome {
        info!(file = %path.display(), "About to process");

        let body = match tokio::fs::read(path).await {
            Ok(body) => body,
            Err(e) => {
                // Nothing was sent, so the error text doubles as the job tag.
                return SubmitOutcome::Failed(FailedJob::new(
                    e.to_string(),
                    path,
                    FailureCause::ReadFailed(e.to_string()),
                ));
            }
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.submit(self.kind, body.clone()).await {
                Ok(reply) => return self.interpret(reply, path),
                Err(e) => {
                    warn!(
                        file = %path.display(),
                        attempt,
                        max_attempts = self.retry_count,
                        "Submit attempt failed: {}",
                        e
                    );
                    if attempt >= self.retry_count {
                        let tag = format!("{}:{}", Utc::now().to_rfc3339(), e);
                        return SubmitOutcome::Failed(FailedJob::new(
                            tag,
                            path,
                            FailureCause::RetriesExhausted {
                                attempts: attempt,
                                last_error: e.to_string(),
                            },
                        ));
                    }
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    fn interpret(&self, reply: ApiReply, path: &Path) -> SubmitOutcome {
        if !reply.is_ok() {
            debug!(file = %path.display(), body = %reply.body, "Submit rejected");
            return SubmitOutcome::Failed(FailedJob::new(
                "",
                path,
                FailureCause::SubmitRejected {
                    status: reply.status,
                },
            ));
        }

        match parse_submit_body(&reply.body) {
            Ok(job_id) => {
                info!(
                    file = %path.display(),
                    job_id = %job_id,
                    "Posted file, about to start checking on status"
                );
                SubmitOutcome::Tracked(Job {
                    job_id,
                    filename: path.to_path_buf(),
                    kind: self.kind,
                })
            }
            Err(e) => SubmitOutcome::Failed(FailedJob::new(
                PARSE_ERROR_TAG,
                path,
                FailureCause::UnparsableSubmitResponse(e.to_string()),
            )),
        }
    }
}
