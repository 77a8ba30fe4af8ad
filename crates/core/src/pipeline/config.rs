//! Pipeline tuning knobs.

use std::time::Duration;

use crate::config::PusherConfig;

/// Runtime parameters for the upload pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of concurrent submitters (also the tracker queue depth).
    pub parallelism: usize,
    /// Sleep before each status poll and between submit attempts.
    pub poll_interval: Duration,
    /// Submit attempts per file; only transport failures are retried.
    pub retry_count: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallelism: 20,
            poll_interval: Duration::from_secs(60),
            retry_count: 3,
        }
    }
}

impl From<&PusherConfig> for PipelineConfig {
    fn from(config: &PusherConfig) -> Self {
        Self {
            parallelism: config.parallelism.max(1),
            poll_interval: Duration::from_secs(config.poll_interval_minutes.saturating_mul(60)),
            retry_count: config.retry_count.max(1),
        }
    }
}
