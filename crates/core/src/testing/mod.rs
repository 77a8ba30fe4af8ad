//! Test doubles for the ingestion service.
//!
//! # Example
//!
//! ```rust,ignore
//! use numerx_core::testing::MockIngestClient;
//!
//! let client = MockIngestClient::new();
//! client.push_submit(Ok(ApiReply::new(200, r#"{"id":"J1"}"#)));
//! client.push_status("J1", Ok(ApiReply::new(200, "[]")));
//! ```

mod mock_client;

pub use mock_client::{MockIngestClient, RecordedSubmit};

/// Canned response bodies.
pub mod fixtures {
    /// Submit body carrying `id`.
    pub fn submit_body(id: &str) -> String {
        format!(r#"{{"id":"{}"}}"#, id)
    }

    /// Status body listing `(step, status)` pairs for job `id`.
    pub fn status_body(id: &str, steps: &[(&str, &str)]) -> String {
        let entries: Vec<String> = steps
            .iter()
            .enumerate()
            .map(|(i, (step, status))| {
                format!(
                    r#"{{"id":"{}","step":"{}","status":"{}","timestamp":{},"notes":""}}"#,
                    id,
                    step,
                    status,
                    1465588543502_i64 + i as i64
                )
            })
            .collect();
        format!("[{}]", entries.join(","))
    }

    /// Terminal success for either pipeline.
    pub fn completed_body(id: &str) -> String {
        status_body(
            id,
            &[("eventindexstatus", "success"), ("metaindexstatus", "success")],
        )
    }
}
