pub mod client;
pub mod config;
pub mod ingest;
pub mod inputs;
pub mod pipeline;
pub mod report;
pub mod testing;

pub use client::{ApiReply, ClientError, IngestClient, NumerxClient};
pub use config::{
    base_figment, extract_config, load_config, load_config_from_str, validate_config, ConfigError,
    InputConfig, PusherConfig, SanitizedConfig,
};
pub use ingest::{classify, FailedJob, FailureCause, Job, RequestKind, StepOutcome, StepReport};
pub use inputs::{collect_inputs, InputError};
pub use pipeline::{PipelineConfig, PipelineError, PipelineSummary, UploadPipeline};
pub use report::FailureReport;
