//! Mock ingestion client for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::{ApiReply, ClientError, IngestClient};
use crate::ingest::RequestKind;

use super::fixtures;

/// A recorded submit call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSubmit {
    pub kind: RequestKind,
    pub body: Vec<u8>,
}

#[derive(Debug, Default)]
struct StatusScript {
    replies: VecDeque<Result<ApiReply, ClientError>>,
    /// Replayed once the script runs out.
    last: Option<Result<ApiReply, ClientError>>,
    calls: usize,
    in_flight: usize,
}

/// Mock implementation of the IngestClient trait.
///
/// Provides controllable behavior for testing:
/// - Scripted submit replies, consumed in order. Once exhausted every
///   submit succeeds with a generated id (`job-1`, `job-2`, ...)
/// - Scripted status replies per job id. The last one is replayed when the
///   script runs out; unscripted jobs complete immediately
/// - Concurrency high-water marks for submits and per-job status calls
#[derive(Debug, Default)]
pub struct MockIngestClient {
    submits: Mutex<VecDeque<Result<ApiReply, ClientError>>>,
    recorded: Mutex<Vec<RecordedSubmit>>,
    statuses: Mutex<HashMap<String, StatusScript>>,
    submit_delay: Mutex<Duration>,
    status_delay: Mutex<Duration>,
    id_counter: AtomicUsize,
    active_submits: AtomicUsize,
    max_active_submits: AtomicUsize,
    max_status_per_job: AtomicUsize,
}

impl MockIngestClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the reply for the next submit call.
    pub fn push_submit(&self, reply: Result<ApiReply, ClientError>) {
        self.submits.lock().unwrap().push_back(reply);
    }

    /// Queue the reply for the next status call of `job_id`.
    pub fn push_status(&self, job_id: &str, reply: Result<ApiReply, ClientError>) {
        self.statuses
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default()
            .replies
            .push_back(reply);
    }

    /// Simulate submit latency (makes concurrency observable).
    pub fn set_submit_delay(&self, delay: Duration) {
        *self.submit_delay.lock().unwrap() = delay;
    }

    /// Simulate status latency.
    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = delay;
    }

    pub fn submit_calls(&self) -> Vec<RecordedSubmit> {
        self.recorded.lock().unwrap().clone()
    }

    /// Number of status calls made for `job_id`.
    pub fn status_calls(&self, job_id: &str) -> usize {
        self.statuses
            .lock()
            .unwrap()
            .get(job_id)
            .map(|s| s.calls)
            .unwrap_or(0)
    }

    /// Highest number of submits observed in flight at once.
    pub fn max_concurrent_submits(&self) -> usize {
        self.max_active_submits.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent status calls observed for any single job.
    pub fn max_concurrent_status_per_job(&self) -> usize {
        self.max_status_per_job.load(Ordering::SeqCst)
    }

    fn next_submit_reply(&self) -> Result<ApiReply, ClientError> {
        if let Some(reply) = self.submits.lock().unwrap().pop_front() {
            return reply;
        }
        let n = self.id_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ApiReply::new(200, fixtures::submit_body(&format!("job-{}", n))))
    }

    fn begin_status(&self, job_id: &str) -> Result<ApiReply, ClientError> {
        let mut statuses = self.statuses.lock().unwrap();
        let script = statuses.entry(job_id.to_string()).or_default();
        script.calls += 1;
        script.in_flight += 1;
        self.max_status_per_job
            .fetch_max(script.in_flight, Ordering::SeqCst);

        match script.replies.pop_front() {
            Some(reply) => {
                script.last = Some(reply.clone());
                reply
            }
            None => script
                .last
                .clone()
                .unwrap_or_else(|| Ok(ApiReply::new(200, fixtures::completed_body(job_id)))),
        }
    }

    fn end_status(&self, job_id: &str) {
        if let Some(script) = self.statuses.lock().unwrap().get_mut(job_id) {
            script.in_flight -= 1;
        }
    }
}

#[async_trait]
impl IngestClient for MockIngestClient {
    async fn submit(&self, kind: RequestKind, body: Vec<u8>) -> Result<ApiReply, ClientError> {
        let active = self.active_submits.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_submits.fetch_max(active, Ordering::SeqCst);

        self.recorded.lock().unwrap().push(RecordedSubmit { kind, body });

        let delay = *self.submit_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let reply = self.next_submit_reply();
        self.active_submits.fetch_sub(1, Ordering::SeqCst);
        reply
    }

    async fn status(&self, job_id: &str) -> Result<ApiReply, ClientError> {
        let reply = self.begin_status(job_id);

        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.end_status(job_id);
        reply
    }
}
