//! Concurrent upload-and-poll pipeline.
//!
//! - **Submitters**: bounded pool, one task per file, POST with retries
//! - **Tracker**: dispatcher spawning one poller per accepted job
//! - **Collector**: single task accumulating failed jobs

mod collector;
mod config;
mod runner;
mod submitter;
mod tracker;
mod types;

pub use collector::{create_failure_channel, FailureCollector, FailureHandle};
pub use config::PipelineConfig;
pub use runner::UploadPipeline;
pub use submitter::{Submitter, PARSE_ERROR_TAG};
pub use tracker::{Poller, TrackerDispatcher, TrackerSummary};
pub use types::{PipelineError, PipelineStats, PipelineSummary, PollOutcome, SubmitOutcome};
