//! Client for the NumerX ingestion service.
//!
//! The `IngestClient` trait covers the two endpoints the uploader needs
//! (submit a CSV, query processing status). `NumerxClient` talks HTTP;
//! `testing::MockIngestClient` scripts replies for tests.

mod numerx;
mod types;

pub use numerx::NumerxClient;
pub use types::*;
