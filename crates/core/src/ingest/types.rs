//! Records exchanged between the submitters, pollers and the failure collector.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::RequestKind;

/// Status value the service reports for a finished step.
pub const STATUS_SUCCESS: &str = "success";
/// Status value the service reports for a failed step.
pub const STATUS_FAILED: &str = "failed";

/// A step of the service's processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingStep {
    RawEvent,
    ParsedEvent,
    EventIndex,
    RawMeta,
    ParsedMeta,
    MetaIndex,
}

impl ProcessingStep {
    /// Parse the wire name of a step. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rawevent" => Some(ProcessingStep::RawEvent),
            "parsedevent" => Some(ProcessingStep::ParsedEvent),
            "eventindexstatus" => Some(ProcessingStep::EventIndex),
            "rawmeta" => Some(ProcessingStep::RawMeta),
            "parsedmeta" => Some(ProcessingStep::ParsedMeta),
            "metaindexstatus" => Some(ProcessingStep::MetaIndex),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStep::RawEvent => "rawevent",
            ProcessingStep::ParsedEvent => "parsedevent",
            ProcessingStep::EventIndex => "eventindexstatus",
            ProcessingStep::RawMeta => "rawmeta",
            ProcessingStep::ParsedMeta => "parsedmeta",
            ProcessingStep::MetaIndex => "metaindexstatus",
        }
    }
}

impl fmt::Display for ProcessingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a status response.
///
/// The service is not consistent about which fields it fills in, so every
/// field falls back to its default when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepReport {
    pub id: String,
    pub step: String,
    pub status: String,
    pub timestamp: i64,
    pub notes: String,
}

impl StepReport {
    /// Convenience constructor used by tests and mocks.
    pub fn new(step: &str, status: &str) -> Self {
        Self {
            step: step.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    pub fn processing_step(&self) -> Option<ProcessingStep> {
        ProcessingStep::parse(&self.step)
    }

    pub fn succeeded(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn failed(&self) -> bool {
        self.status == STATUS_FAILED
    }
}

/// A submission the service accepted and which is now being tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub filename: PathBuf,
    pub kind: RequestKind,
}

/// Why a file did not reach terminal success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The source file could not be read; nothing was sent.
    ReadFailed(String),
    /// Every POST attempt failed at the transport level.
    RetriesExhausted { attempts: u32, last_error: String },
    /// The service answered the POST with a non-200 status.
    SubmitRejected { status: u16 },
    /// The POST succeeded but the body did not carry a usable id.
    UnparsableSubmitResponse(String),
    /// The status endpoint answered with a non-200 status.
    StatusRejected { status: u16 },
    /// The service reported a failed processing step.
    StepFailed { step: String, notes: String },
    /// Status tracking for an accepted job died before reaching an outcome.
    TrackingAborted(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::ReadFailed(e) => write!(f, "could not read file: {}", e),
            FailureCause::RetriesExhausted {
                attempts,
                last_error,
            } => write!(f, "submit failed after {} attempts: {}", attempts, last_error),
            FailureCause::SubmitRejected { status } => write!(f, "submit rejected with HTTP {}", status),
            FailureCause::UnparsableSubmitResponse(e) => write!(f, "unparsable submit response: {}", e),
            FailureCause::StatusRejected { status } => {
                write!(f, "status check rejected with HTTP {}", status)
            }
            FailureCause::StepFailed { step, notes } if notes.is_empty() => {
                write!(f, "step {} failed", step)
            }
            FailureCause::StepFailed { step, notes } => write!(f, "step {} failed: {}", step, notes),
            FailureCause::TrackingAborted(e) => write!(f, "status tracking aborted: {}", e),
        }
    }
}

/// A file that will not be ingested.
///
/// `job_id` holds the service id when one was issued. Otherwise it is empty
/// or carries an error tag describing how the submission broke down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedJob {
    pub job_id: String,
    pub filename: PathBuf,
    pub cause: FailureCause,
}

impl FailedJob {
    pub fn new(job_id: impl Into<String>, filename: impl Into<PathBuf>, cause: FailureCause) -> Self {
        Self {
            job_id: job_id.into(),
            filename: filename.into(),
            cause,
        }
    }

    /// Failure of a job the service had already accepted.
    pub fn for_job(job: &Job, cause: FailureCause) -> Self {
        Self::new(job.job_id.clone(), job.filename.clone(), cause)
    }
}
