use super::{types::PusherConfig, ConfigError};

/// Validate configuration before any task is started.
///
/// Checks:
/// - credential and base URL are present, base URL is http(s)
/// - parallelism, retry count and poll interval are non-zero
/// - a file or a directory was selected
pub fn validate_config(config: &PusherConfig) -> Result<(), ConfigError> {
    if config.credential.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "authorization credential is required".to_string(),
        ));
    }

    if config.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "base URL is required".to_string(),
        ));
    }

    if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "base URL must start with http:// or https://, got {}",
            config.base_url
        )));
    }

    if config.parallelism == 0 {
        return Err(ConfigError::ValidationError(
            "parallelism cannot be 0".to_string(),
        ));
    }

    if config.retry_count == 0 {
        return Err(ConfigError::ValidationError(
            "retry count cannot be 0".to_string(),
        ));
    }

    if config.poll_interval_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "poll interval cannot be 0".to_string(),
        ));
    }

    if config.input.file.is_none() && config.input.dir.is_none() {
        return Err(ConfigError::ValidationError(
            "input file name or working directory is not provided".to_string(),
        ));
    }

    Ok(())
}
