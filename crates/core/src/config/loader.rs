use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::PusherConfig, ConfigError};

/// Environment variable prefix for overrides, e.g. `NUMERX_BASE_URL`.
pub const ENV_PREFIX: &str = "NUMERX_";

/// Build the layered configuration source: defaults, then the optional TOML
/// file, then `NUMERX_*` environment variables. Callers may merge further
/// providers (command-line flags) on top before extracting.
pub fn base_figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(PusherConfig::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    Ok(figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__")))
}

/// Extract the final configuration from a figment.
pub fn extract_config(figment: &Figment) -> Result<PusherConfig, ConfigError> {
    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<PusherConfig, ConfigError> {
    extract_config(&base_figment(Some(path))?)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<PusherConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
