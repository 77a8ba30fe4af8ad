//! Domain model of the NumerX ingestion workflow.
//!
//! - [`RequestKind`]: which endpoint an upload goes to
//! - [`Job`] / [`FailedJob`]: what the pipeline tracks and reports
//! - [`classify`]: the step state machine applied to status responses

mod kind;
mod steps;
mod types;

pub use kind::RequestKind;
pub use steps::{classify, StepOutcome};
pub use types::*;
