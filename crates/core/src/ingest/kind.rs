//! Upload categories accepted by the ingestion service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

use super::types::ProcessingStep;

/// What a CSV upload is about.
///
/// Each kind maps to its own submit endpoint and, for the meta kinds, the
/// column the service uses as row key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    #[serde(rename = "events")]
    Viewership,
    #[serde(rename = "meta-chanmap")]
    MetaChanMap,
    #[serde(rename = "meta-billing")]
    MetaBilling,
    #[serde(rename = "meta-program")]
    MetaProgram,
    #[serde(rename = "meta-eventmap")]
    MetaEventMap,
}

impl RequestKind {
    /// Every kind, in the order they are listed to users.
    pub const ALL: [RequestKind; 5] = [
        RequestKind::Viewership,
        RequestKind::MetaChanMap,
        RequestKind::MetaBilling,
        RequestKind::MetaProgram,
        RequestKind::MetaEventMap,
    ];

    /// URL path appended to the base URL when submitting.
    pub fn path(&self) -> &'static str {
        match self {
            RequestKind::Viewership => "/events/viewer",
            RequestKind::MetaChanMap => "/meta/chanmap",
            RequestKind::MetaBilling => "/meta/billing",
            RequestKind::MetaProgram => "/meta/program_id",
            RequestKind::MetaEventMap => "/meta/eventmap",
        }
    }

    /// Row key column for meta uploads; empty for viewership.
    pub fn row_key(&self) -> &'static str {
        match self {
            RequestKind::Viewership => "",
            RequestKind::MetaChanMap => "display_channel_number",
            RequestKind::MetaBilling => "device_id",
            RequestKind::MetaProgram => "ID",
            RequestKind::MetaEventMap => "Event_Type",
        }
    }

    /// Selector token used on the command line and in config files.
    pub fn token(&self) -> &'static str {
        match self {
            RequestKind::Viewership => "events",
            RequestKind::MetaChanMap => "meta-chanmap",
            RequestKind::MetaBilling => "meta-billing",
            RequestKind::MetaProgram => "meta-program",
            RequestKind::MetaEventMap => "meta-eventmap",
        }
    }

    pub fn is_meta(&self) -> bool {
        !matches!(self, RequestKind::Viewership)
    }

    /// The step whose `success` means the upload is fully indexed.
    pub fn terminal_step(&self) -> ProcessingStep {
        if self.is_meta() {
            ProcessingStep::MetaIndex
        } else {
            ProcessingStep::EventIndex
        }
    }

    /// Steps before the terminal one; a failure there cannot recover.
    pub fn upstream_steps(&self) -> [ProcessingStep; 2] {
        if self.is_meta() {
            [ProcessingStep::RawMeta, ProcessingStep::ParsedMeta]
        } else {
            [ProcessingStep::RawEvent, ProcessingStep::ParsedEvent]
        }
    }

    /// Query parameters sent along with the CSV body.
    pub fn query_params(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            RequestKind::Viewership => vec![
                ("timestamp", "event_date"),
                ("format", "event_date,timestamp,regex (.*),$1 00:00:00"),
                ("csvHeaderLine", "1"),
            ],
            _ => vec![("key", self.row_key()), ("csvHeaderLine", "1")],
        }
    }

    /// All selector tokens, for error messages and help output.
    pub fn valid_tokens() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.token()).collect()
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for RequestKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.token() == s)
            .ok_or_else(|| ConfigError::InvalidKind {
                token: s.to_string(),
                valid: Self::valid_tokens().join(", "),
            })
    }
}
