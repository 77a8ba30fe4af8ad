//! Types for the upload pipeline.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::{FailedJob, Job};

/// Errors that abort a pipeline run.
///
/// Per-file problems never surface here; they become [`FailedJob`]s.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A coordinator task panicked or was cancelled.
    #[error("{task} task failed: {reason}")]
    TaskFailed { task: &'static str, reason: String },
}

/// What a submitter produced for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Tracked(Job),
    Failed(FailedJob),
}

/// How a poller finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed,
}

/// Live counters shared by the pipeline tasks.
#[derive(Debug, Default)]
pub struct PipelineStats {
    submitted: AtomicU64,
    tracked: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl PipelineStats {
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tracked(&self) {
        self.tracked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            submitted: self.submitted.load(Ordering::Relaxed),
            tracked: self.tracked.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Files handed to a submitter.
    pub submitted: u64,
    /// Files the service accepted and that got a poller.
    pub tracked: u64,
    /// Jobs that reached terminal success.
    pub completed: u64,
    /// Files that ended up in the failure report.
    pub failed: u64,
}
