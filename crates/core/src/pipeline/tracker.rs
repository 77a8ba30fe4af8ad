//! Status tracking: one poller per accepted job, spawned by the dispatcher.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::client::{parse_status_body, IngestClient};
use crate::ingest::{classify, FailedJob, FailureCause, Job, StepOutcome};

use super::collector::FailureHandle;
use super::types::{PipelineStats, PollOutcome};

/// Drives a single job to a terminal outcome.
#[derive(Clone)]
pub struct Poller {
    client: Arc<dyn IngestClient>,
    interval: Duration,
    failures: FailureHandle,
    stats: Arc<PipelineStats>,
}

impl Poller {
    pub fn new(
        client: Arc<dyn IngestClient>,
        interval: Duration,
        failures: FailureHandle,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            client,
            interval,
            failures,
            stats,
        }
    }

    /// Poll until the service reports a terminal step or rejects the query.
    ///
    /// Transport errors are logged and polling continues indefinitely.
    pub async fn run(self, job: Job) -> PollOutcome {
        loop {
            debug!(job_id = %job.job_id, "Waiting for job");
            tokio::time::sleep(self.interval).await;

            let reply = match self.client.status(&job.job_id).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(job_id = %job.job_id, "Status check failed, will retry: {}", e);
                    continue;
                }
            };

            if !reply.is_ok() {
                return self
                    .fail(&job, FailureCause::StatusRejected {
                        status: reply.status,
                    })
                    .await;
            }

            let reports = match parse_status_body(&reply.body) {
                Ok(reports) => reports,
                Err(e) => {
                    warn!(
                        job_id = %job.job_id,
                        file = %job.filename.display(),
                        "Unreadable status response, will retry: {}",
                        e
                    );
                    continue;
                }
            };

            match classify(job.kind, &reports) {
                StepOutcome::Completed => {
                    info!(job_id = %job.job_id, file = %job.filename.display(), "Complete");
                    self.stats.record_completed();
                    return PollOutcome::Completed;
                }
                StepOutcome::Failed { step, notes } => {
                    return self.fail(&job, FailureCause::StepFailed { step, notes }).await;
                }
                StepOutcome::Pending => {
                    debug!(
                        job_id = %job.job_id,
                        file = %job.filename.display(),
                        steps = reports.len(),
                        "Not yet"
                    );
                }
            }
        }
    }

    async fn fail(&self, job: &Job, cause: FailureCause) -> PollOutcome {
        self.stats.record_failed();
        self.failures.report(FailedJob::for_job(job, cause)).await;
        PollOutcome::Failed
    }
}

/// Counts of how pollers finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerSummary {
    pub completed: usize,
    pub failed: usize,
    /// Pollers that panicked; their jobs are reported as failed.
    pub aborted: usize,
}

/// Receives accepted jobs and spawns one poller per job.
///
/// Returns once its input channel is closed and every poller has finished.
pub struct TrackerDispatcher {
    rx: mpsc::Receiver<Job>,
    poller: Poller,
}

impl TrackerDispatcher {
    pub fn new(rx: mpsc::Receiver<Job>, poller: Poller) -> Self {
        Self { rx, poller }
    }

    pub async fn run(mut self) -> TrackerSummary {
        info!("Ready to start getting ids to wait for completion");

        let mut pollers: JoinSet<PollOutcome> = JoinSet::new();
        let mut jobs: HashMap<task::Id, Job> = HashMap::new();
        let mut summary = TrackerSummary::default();

        loop {
            tokio::select! {
                next = self.rx.recv() => match next {
                    Some(job) => {
                        info!(job_id = %job.job_id, "Starting waiting for job");
                        let handle = pollers.spawn(self.poller.clone().run(job.clone()));
                        jobs.insert(handle.id(), job);
                    }
                    None => break,
                },
                Some(result) = pollers.join_next_with_id(), if !pollers.is_empty() => {
                    Self::record(&self.poller, &mut jobs, &mut summary, result).await;
                }
            }
        }

        info!(in_flight = pollers.len(), "Got all ids, waiting for status checks to complete");
        while let Some(result) = pollers.join_next_with_id().await {
            Self::record(&self.poller, &mut jobs, &mut summary, result).await;
        }

        summary
    }

    async fn record(
        poller: &Poller,
        jobs: &mut HashMap<task::Id, Job>,
        summary: &mut TrackerSummary,
        result: Result<(task::Id, PollOutcome), JoinError>,
    ) {
        match result {
            Ok((id, outcome)) => {
                jobs.remove(&id);
                match outcome {
                    PollOutcome::Completed => summary.completed += 1,
                    PollOutcome::Failed => summary.failed += 1,
                }
            }
            Err(e) => {
                error!("Poller task failed: {}", e);
                summary.aborted += 1;
                if let Some(job) = jobs.remove(&e.id()) {
                    poller
                        .fail(&job, FailureCause::TrackingAborted(e.to_string()))
                        .await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiReply, ClientError};
    use async_trait::async_trait;
    use crate::ingest::RequestKind;
    use crate::pipeline::collector::create_failure_channel;
    use crate::testing::MockIngestClient;
    use std::path::PathBuf;

    const INTERVAL: Duration = Duration::from_millis(5);

    fn job(id: &str, kind: RequestKind) -> Job {
        Job {
            job_id: id.to_string(),
            filename: PathBuf::from(format!("{}.csv", id)),
            kind,
        }
    }

    async fn poll(client: Arc<MockIngestClient>, job: Job) -> (PollOutcome, Vec<FailedJob>) {
        let (failures, collector) = create_failure_channel(4);
        let collector_task = tokio::spawn(collector.run());
        let poller = Poller::new(client, INTERVAL, failures, Arc::new(PipelineStats::default()));

        let outcome = poller.run(job).await;
        (outcome, collector_task.await.unwrap())
    }

    #[tokio::test]
    async fn test_completes_after_pending_responses() {
        let client = Arc::new(MockIngestClient::new());
        client.push_status("J3", Ok(ApiReply::new(200, "[]")));
        client.push_status(
            "J3",
            Ok(ApiReply::new(200, r#"[{"step":"rawevent","status":"success"}]"#)),
        );
        client.push_status(
            "J3",
            Ok(ApiReply::new(200, r#"[{"step":"eventindexstatus","status":"success"}]"#)),
        );

        let (outcome, failures) = poll(client.clone(), job("J3", RequestKind::Viewership)).await;
        assert_eq!(outcome, PollOutcome::Completed);
        assert!(failures.is_empty());
        assert_eq!(client.status_calls("J3"), 3);
    }

    #[tokio::test]
    async fn test_upstream_failure_reports_job() {
        let client = Arc::new(MockIngestClient::new());
        client.push_status(
            "J2",
            Ok(ApiReply::new(
                200,
                r#"[{"step":"rawmeta","status":"success"},{"step":"parsedmeta","status":"failed"}]"#,
            )),
        );

        let (outcome, failures) = poll(client, job("J2", RequestKind::MetaChanMap)).await;
        assert_eq!(outcome, PollOutcome::Failed);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].job_id, "J2");
        assert_eq!(failures[0].filename, PathBuf::from("J2.csv"));
    }

    #[tokio::test]
    async fn test_non_200_status_terminates() {
        let client = Arc::new(MockIngestClient::new());
        client.push_status("J9", Ok(ApiReply::new(404, "unknown job")));

        let (outcome, failures) = poll(client.clone(), job("J9", RequestKind::Viewership)).await;
        assert_eq!(outcome, PollOutcome::Failed);
        assert_eq!(failures[0].cause, FailureCause::StatusRejected { status: 404 });
        assert_eq!(client.status_calls("J9"), 1);
    }

    #[tokio::test]
    async fn test_transport_errors_keep_polling() {
        let client = Arc::new(MockIngestClient::new());
        client.push_status("J4", Err(ClientError::Timeout));
        client.push_status("J4", Err(ClientError::ConnectionFailed("reset".to_string())));
        client.push_status(
            "J4",
            Ok(ApiReply::new(200, r#"[{"step":"metaindexstatus","status":"success"}]"#)),
        );

        let (outcome, failures) = poll(client.clone(), job("J4", RequestKind::MetaBilling)).await;
        assert_eq!(outcome, PollOutcome::Completed);
        assert!(failures.is_empty());
        assert_eq!(client.status_calls("J4"), 3);
    }

    #[tokio::test]
    async fn test_unreadable_body_keeps_polling() {
        let client = Arc::new(MockIngestClient::new());
        client.push_status("J6", Ok(ApiReply::new(200, "<html>")));
        client.push_status(
            "J6",
            Ok(ApiReply::new(200, r#"[{"step":"eventindexstatus","status":"failed","notes":"bad rows"}]"#)),
        );

        let (outcome, failures) = poll(client, job("J6", RequestKind::Viewership)).await;
        assert_eq!(outcome, PollOutcome::Failed);
        assert_eq!(
            failures[0].cause,
            FailureCause::StepFailed {
                step: "eventindexstatus".to_string(),
                notes: "bad rows".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_dispatcher_spawns_one_poller_per_job() {
        let client = Arc::new(MockIngestClient::new());
        for id in ["A", "B", "C"] {
            client.push_status(
                id,
                Ok(ApiReply::new(200, r#"[{"step":"eventindexstatus","status":"success"}]"#)),
            );
        }
        client.push_status("D", Ok(ApiReply::new(500, "")));

        let (failures, collector) = create_failure_channel(4);
        let collector_task = tokio::spawn(collector.run());
        let stats = Arc::new(PipelineStats::default());
        let poller = Poller::new(client.clone(), INTERVAL, failures, Arc::clone(&stats));

        let (tx, rx) = mpsc::channel(2);
        let dispatcher = tokio::spawn(TrackerDispatcher::new(rx, poller).run());
        for id in ["A", "B", "C", "D"] {
            tx.send(job(id, RequestKind::Viewership)).await.unwrap();
        }
        drop(tx);

        let summary = dispatcher.await.unwrap();
        assert_eq!(
            summary,
            TrackerSummary {
                completed: 3,
                failed: 1,
                aborted: 0,
            }
        );
        assert_eq!(collector_task.await.unwrap().len(), 1);
        assert_eq!(stats.summary().completed, 3);
        assert_eq!(client.max_concurrent_status_per_job(), 1);
    }

    #[tokio::test]
    async fn test_dispatcher_with_no_jobs() {
        let client = Arc::new(MockIngestClient::new());
        let (failures, _collector) = create_failure_channel(1);
        let poller = Poller::new(client, INTERVAL, failures, Arc::new(PipelineStats::default()));

        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let summary = TrackerDispatcher::new(rx, poller).run().await;
        assert_eq!(summary, TrackerSummary::default());
    }

    #[tokio::test]
    async fn test_dispatcher_never_overlaps_polls_of_one_job() {
        let client = Arc::new(MockIngestClient::new());
        client.set_status_delay(Duration::from_millis(20));
        for id in ["A", "B"] {
            client.push_status(id, Ok(ApiReply::new(200, "[]")));
            client.push_status(
                id,
                Ok(ApiReply::new(200, r#"[{"step":"eventindexstatus","status":"success"}]"#)),
            );
        }

        let (failures, _collector) = create_failure_channel(4);
        let poller = Poller::new(
            client.clone(),
            Duration::ZERO,
            failures,
            Arc::new(PipelineStats::default()),
        );

        let (tx, rx) = mpsc::channel(2);
        for id in ["A", "B"] {
            tx.send(job(id, RequestKind::Viewership)).await.unwrap();
        }
        drop(tx);

        let summary = TrackerDispatcher::new(rx, poller).run().await;
        assert_eq!(summary.completed, 2);
        assert_eq!(client.status_calls("A"), 2);
        assert_eq!(client.max_concurrent_status_per_job(), 1);
    }

    /// Panics when asked about job `P`; every other job completes.
    struct PanickingClient;

    #[async_trait]
    impl IngestClient for PanickingClient {
        async fn submit(&self, _kind: RequestKind, _body: Vec<u8>) -> Result<ApiReply, ClientError> {
            Err(ClientError::Internal("not used".to_string()))
        }

        async fn status(&self, job_id: &str) -> Result<ApiReply, ClientError> {
            if job_id == "P" {
                panic!("status handler blew up");
            }
            Ok(ApiReply::new(200, r#"[{"step":"eventindexstatus","status":"success"}]"#))
        }
    }

    #[tokio::test]
    async fn test_panicked_poller_reports_its_job() {
        let (failures, collector) = create_failure_channel(4);
        let collector_task = tokio::spawn(collector.run());
        let stats = Arc::new(PipelineStats::default());
        let poller = Poller::new(Arc::new(PanickingClient), INTERVAL, failures, Arc::clone(&stats));

        let (tx, rx) = mpsc::channel(2);
        tx.send(job("OK", RequestKind::Viewership)).await.unwrap();
        tx.send(job("P", RequestKind::Viewership)).await.unwrap();
        drop(tx);

        let summary = TrackerDispatcher::new(rx, poller).run().await;
        assert_eq!(
            summary,
            TrackerSummary {
                completed: 1,
                failed: 0,
                aborted: 1,
            }
        );

        let failed = collector_task.await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].job_id, "P");
        assert_eq!(failed[0].filename, PathBuf::from("P.csv"));
        assert!(matches!(failed[0].cause, FailureCause::TrackingAborted(_)));
        assert_eq!(stats.summary().failed, 1);
    }
}
