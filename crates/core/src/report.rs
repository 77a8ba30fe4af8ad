//! Final failure report printed at the end of a run.

use std::fmt;
use std::time::Duration;

use crate::ingest::FailedJob;
use crate::pipeline::PipelineSummary;

/// Every file that did not reach terminal success, in arrival order.
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub failures: Vec<FailedJob>,
    pub files_processed: usize,
    pub elapsed: Duration,
    pub summary: PipelineSummary,
}

impl FailureReport {
    pub fn new(
        failures: Vec<FailedJob>,
        files_processed: usize,
        elapsed: Duration,
        summary: PipelineSummary,
    ) -> Self {
        Self {
            failures,
            files_processed,
            elapsed,
            summary,
        }
    }

    /// True when no file failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            writeln!(f, "No failed jobs reported")?;
        } else {
            for job in &self.failures {
                writeln!(
                    f,
                    "Failed job: [{}], file: {} ({})",
                    job.job_id,
                    job.filename.display(),
                    job.cause
                )?;
            }
        }
        write!(
            f,
            "Processed {} files, in {:.2?} ({} accepted, {} completed, {} failed)",
            self.files_processed,
            self.elapsed,
            self.summary.tracked,
            self.summary.completed,
            self.failures.len()
        )
    }
}
