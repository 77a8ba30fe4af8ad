//! Failure collection: a single task gathering every failed job of a run.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::ingest::FailedJob;

/// Handle for reporting failed jobs
///
/// Cheaply cloneable; every submitter and poller holds one. The collector
/// finishes once the last handle is dropped.
#[derive(Clone)]
pub struct FailureHandle {
    tx: mpsc::Sender<FailedJob>,
}

impl FailureHandle {
    pub fn new(tx: mpsc::Sender<FailedJob>) -> Self {
        Self { tx }
    }

    /// Deliver a failed job to the collector.
    ///
    /// Waits for buffer space rather than dropping the report. A closed
    /// channel is logged; it only happens if the collector task died.
    pub async fn report(&self, failed: FailedJob) {
        warn!(
            job_id = %failed.job_id,
            file = %failed.filename.display(),
            "Job failed: {}",
            failed.cause
        );
        if let Err(e) = self.tx.send(failed).await {
            error!("Failed to deliver failed job report: {}", e);
        }
    }
}

/// Single consumer that accumulates failed jobs in arrival order.
pub struct FailureCollector {
    rx: mpsc::Receiver<FailedJob>,
}

impl FailureCollector {
    pub fn new(rx: mpsc::Receiver<FailedJob>) -> Self {
        Self { rx }
    }

    /// Drain the channel until every handle is dropped.
    ///
    /// Spawn with `tokio::spawn(collector.run())`.
    pub async fn run(mut self) -> Vec<FailedJob> {
        info!("Failure collector started");

        let mut failures = Vec::new();
        while let Some(failed) = self.rx.recv().await {
            failures.push(failed);
        }

        info!(count = failures.len(), "Got all failed jobs");
        failures
    }
}

/// Create a connected handle/collector pair.
///
/// `buffer_size` bounds the channel; reporters wait when it is full.
pub fn create_failure_channel(buffer_size: usize) -> (FailureHandle, FailureCollector) {
    let (tx, rx) = mpsc::channel(buffer_size.max(1));
    (FailureHandle::new(tx), FailureCollector::new(rx))
}
