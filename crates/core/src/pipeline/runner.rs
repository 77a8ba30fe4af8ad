//! Upload pipeline driver.
//!
//! Lifecycle of a run:
//! 1. Start the failure collector and the tracker dispatcher
//! 2. Feed files to at most `parallelism` concurrent submitters
//! 3. Wait for every submitter, then close the tracker input
//! 4. Wait for every poller, then close the failure channel
//! 5. Wait for the collector and build the report

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::client::IngestClient;
use crate::ingest::{Job, RequestKind};
use crate::report::FailureReport;

use super::collector::{create_failure_channel, FailureHandle};
use super::config::PipelineConfig;
use super::submitter::Submitter;
use super::tracker::{Poller, TrackerDispatcher};
use super::types::{PipelineError, PipelineStats, SubmitOutcome};

/// Concurrent upload-and-poll pipeline for one request kind.
pub struct UploadPipeline {
    client: Arc<dyn IngestClient>,
    kind: RequestKind,
    config: PipelineConfig,
}

impl UploadPipeline {
    pub fn new(client: Arc<dyn IngestClient>, kind: RequestKind, config: PipelineConfig) -> Self {
        Self {
            client,
            kind,
            config,
        }
    }

    /// Upload every file and wait until each reaches a terminal outcome.
    ///
    /// Per-file failures are collected into the report; an error is returned
    /// only if one of the coordinator tasks dies.
    pub async fn run(&self, files: Vec<PathBuf>) -> Result<FailureReport, PipelineError> {
        let started = Instant::now();
        let files_processed = files.len();
        let parallelism = self.config.parallelism.max(1);
        let stats = Arc::new(PipelineStats::default());

        info!(
            files = files_processed,
            kind = %self.kind,
            parallelism,
            "Starting upload pipeline"
        );

        let (failures, collector) = create_failure_channel(parallelism);
        let collector_task = tokio::spawn(collector.run());

        let (job_tx, job_rx) = mpsc::channel::<Job>(parallelism);
        let poller = Poller::new(
            Arc::clone(&self.client),
            self.config.poll_interval,
            failures.clone(),
            Arc::clone(&stats),
        );
        let tracker_task = tokio::spawn(TrackerDispatcher::new(job_rx, poller).run());

        let submitter = Submitter::new(Arc::clone(&self.client), self.kind, &self.config);
        self.submit_all(files, parallelism, submitter, job_tx, failures.clone(), &stats)
            .await;

        // Every submitter is done and the tracker input is closed.
        info!("Initial POST of files complete, waiting for all status checks to complete");
        let tracker_summary = tracker_task.await.map_err(|e| PipelineError::TaskFailed {
            task: "tracker",
            reason: e.to_string(),
        })?;
        if tracker_summary.aborted > 0 {
            error!(aborted = tracker_summary.aborted, "Some status checks aborted");
        }

        // Pollers are gone; dropping the last handle lets the collector drain.
        drop(failures);
        let failed = collector_task.await.map_err(|e| PipelineError::TaskFailed {
            task: "failure collector",
            reason: e.to_string(),
        })?;

        let report = FailureReport::new(failed, files_processed, started.elapsed(), stats.summary());
        info!(
            failed = report.failures.len(),
            elapsed = ?report.elapsed,
            "Upload pipeline finished"
        );
        Ok(report)
    }

    /// Run one submitter per file, never more than `parallelism` at once.
    ///
    /// Consumes `job_tx`; when this returns every clone of it is dropped.
    async fn submit_all(
        &self,
        files: Vec<PathBuf>,
        parallelism: usize,
        submitter: Submitter,
        job_tx: mpsc::Sender<Job>,
        failures: FailureHandle,
        stats: &Arc<PipelineStats>,
    ) {
        let slots = Arc::new(Semaphore::new(parallelism));
        let mut submitters = JoinSet::new();

        for file in files {
            // Blocks while all slots are taken.
            let permit = match Arc::clone(&slots).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Submitter slots closed: {}", e);
                    break;
                }
            };

            let submitter = submitter.clone();
            let job_tx = job_tx.clone();
            let failures = failures.clone();
            let stats = Arc::clone(stats);

            submitters.spawn(async move {
                let _permit = permit;
                stats.record_submitted();

                match submitter.submit(&file).await {
                    SubmitOutcome::Tracked(job) => {
                        stats.record_tracked();
                        if let Err(e) = job_tx.send(job).await {
                            error!(file = %file.display(), "Failed to hand job to tracker: {}", e);
                        }
                    }
                    SubmitOutcome::Failed(failed) => {
                        stats.record_failed();
                        failures.report(failed).await;
                    }
                }
            });

            while let Some(result) = submitters.try_join_next() {
                if let Err(e) = result {
                    error!("Submitter task failed: {}", e);
                }
            }
        }

        info!("Waiting for all submitters to complete");
        while let Some(result) = submitters.join_next().await {
            if let Err(e) = result {
                error!("Submitter task failed: {}", e);
            }
        }
    }
}
