//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;
use figment::providers::Serialized;
use serde::Serialize;

use numerx_core::{base_figment, extract_config, ConfigError, PusherConfig, RequestKind};

/// Push CSV files to the NumerX ingestion service and wait until they are indexed.
///
/// Provide either a file or a directory; the directory takes over if both are given.
#[derive(Debug, Parser)]
#[command(name = "numerx-pusher", version, about)]
pub struct Cli {
    /// Authorization key, sent verbatim
    #[arg(short = 'a', long = "auth", value_name = "KEY")]
    pub auth: Option<String>,

    /// Base URL of the NumerX service
    #[arg(short = 'b', long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Request/data type: events, meta-chanmap, meta-billing, meta-program, meta-eventmap
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub kind: Option<String>,

    /// Input file to process
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Directory scanned recursively for *.csv files
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Number of files to process concurrently
    #[arg(short = 'c', long = "concurrency", value_name = "N")]
    pub concurrency: Option<usize>,

    /// Verbose output (request and response detail)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Sleep time between status checks, in minutes
    #[arg(short = 's', long = "sleep", value_name = "MINUTES")]
    pub sleep_minutes: Option<u64>,

    /// Submit attempts per file
    #[arg(short = 'r', long = "retry", value_name = "N")]
    pub retry: Option<u32>,

    /// Optional TOML configuration file
    #[arg(long = "config", value_name = "PATH", env = "NUMERX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Input file, when neither --file nor --dir is given
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,
}

/// Values given on the command line, layered over file and environment config.
#[derive(Debug, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<RequestKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub verbose: bool,
    #[serde(skip_serializing_if = "InputOverrides::is_empty")]
    pub input: InputOverrides,
}

#[derive(Debug, Default, Serialize)]
pub struct InputOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl InputOverrides {
    fn is_empty(&self) -> bool {
        self.file.is_none() && self.dir.is_none()
    }
}

impl Cli {
    /// Convert the parsed flags into config overrides.
    ///
    /// Fails on an unknown type token, listing the valid ones.
    pub fn overrides(&self) -> Result<CliOverrides, ConfigError> {
        let kind = self
            .kind
            .as_deref()
            .map(str::parse::<RequestKind>)
            .transpose()?;

        let file = match (&self.file, &self.dir) {
            (None, None) => self.input.clone(),
            _ => self.file.clone(),
        };

        Ok(CliOverrides {
            base_url: self.base_url.clone(),
            credential: self.auth.clone(),
            kind,
            parallelism: self.concurrency,
            poll_interval_minutes: self.sleep_minutes,
            retry_count: self.retry,
            verbose: self.verbose,
            input: InputOverrides {
                file,
                dir: self.dir.clone(),
            },
        })
    }
}

impl Cli {
    /// Resolve the effective config: defaults, file, env, then these flags.
    pub fn load_config(&self) -> Result<PusherConfig, ConfigError> {
        let figment =
            base_figment(self.config.as_deref())?.merge(Serialized::defaults(self.overrides()?));
        extract_config(&figment)
    }
}
