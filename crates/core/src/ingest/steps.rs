//! Interpretation of status responses.
//!
//! The service reports one entry per processing step it has touched. A job is
//! finished once the terminal step for its kind reports `success` or `failed`,
//! or once an upstream step reports `failed`.

use super::types::StepReport;
use super::RequestKind;

/// Result of classifying one status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The terminal step succeeded.
    Completed,
    /// A step failed; the job will never complete.
    Failed { step: String, notes: String },
    /// Nothing conclusive yet.
    Pending,
}

impl StepOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepOutcome::Pending)
    }
}

/// Classify a status response for a job of the given kind.
///
/// Pure function of its inputs. Precedence, independent of entry order:
/// a failed terminal step wins over a successful one, and a successful
/// terminal step wins over failed upstream steps.
pub fn classify(kind: RequestKind, reports: &[StepReport]) -> StepOutcome {
    let terminal = kind.terminal_step();
    let upstream = kind.upstream_steps();

    let mut terminal_success = false;
    let mut terminal_failure: Option<&StepReport> = None;
    let mut upstream_failure: Option<&StepReport> = None;

    for report in reports {
        let Some(step) = report.processing_step() else {
            continue;
        };

        if step == terminal {
            if report.failed() {
                terminal_failure.get_or_insert(report);
            } else if report.succeeded() {
                terminal_success = true;
            }
        } else if upstream.contains(&step) && report.failed() {
            upstream_failure.get_or_insert(report);
        }
    }

    if let Some(report) = terminal_failure {
        return failed(report);
    }
    if terminal_success {
        return StepOutcome::Completed;
    }
    match upstream_failure {
        Some(report) => failed(report),
        None => StepOutcome::Pending,
    }
}

fn failed(report: &StepReport) -> StepOutcome {
    StepOutcome::Failed {
        step: report.step.clone(),
        notes: report.notes.clone(),
    }
}
