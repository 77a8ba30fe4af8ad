//! In-process mock of the NumerX ingestion service.
//!
//! Serves the submit and status endpoints on an ephemeral port so the real
//! `NumerxClient` can be exercised end to end. Responses are scripted per
//! test; every request is recorded for assertions.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{OriginalUri, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;

use numerx_core::testing::fixtures;

/// Path prefix the mock mounts its endpoints under.
pub const API_PREFIX: &str = "/api/v1/roviqa";

/// A POST the mock received.
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// A GET /status the mock received.
#[derive(Debug, Clone)]
pub struct RecordedStatus {
    pub job_id: String,
    pub headers: HeaderMap,
}

#[derive(Default)]
struct StatusScript {
    replies: VecDeque<(u16, String)>,
    last: Option<(u16, String)>,
    in_flight: usize,
}

#[derive(Default)]
struct MockState {
    submit_replies: Mutex<VecDeque<(u16, String)>>,
    status_scripts: Mutex<HashMap<String, StatusScript>>,
    posts: Mutex<Vec<RecordedPost>>,
    status_requests: Mutex<Vec<RecordedStatus>>,
    submit_delay: Mutex<Duration>,
    id_counter: AtomicUsize,
    active_posts: AtomicUsize,
    max_active_posts: AtomicUsize,
    max_status_per_job: AtomicUsize,
}

/// Handle to a running mock service.
pub struct MockNumerx {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockNumerx {
    /// Start the mock on 127.0.0.1 with an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let api = Router::new()
            .route("/events/viewer", post(submit))
            .route("/meta/{kind}", post(submit))
            .route("/status", get(status))
            .with_state(Arc::clone(&state));
        let app = Router::new().nest(API_PREFIX, api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Failed to read mock address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock server failed");
        });

        Self { addr, state }
    }

    /// Base URL to hand to the client.
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    /// Queue the reply for the next POST. Unscripted POSTs get `200 {"id":"J<n>"}`.
    pub fn push_submit(&self, status: u16, body: impl Into<String>) {
        self.state
            .submit_replies
            .lock()
            .unwrap()
            .push_back((status, body.into()));
    }

    /// Queue the reply for the next status query of `job_id`. The last reply
    /// is replayed once the queue runs dry; unscripted jobs complete at once.
    pub fn push_status(&self, job_id: &str, status: u16, body: impl Into<String>) {
        self.state
            .status_scripts
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default()
            .replies
            .push_back((status, body.into()));
    }

    pub fn set_submit_delay(&self, delay: Duration) {
        *self.state.submit_delay.lock().unwrap() = delay;
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.state.posts.lock().unwrap().clone()
    }

    pub fn status_requests(&self) -> Vec<RecordedStatus> {
        self.state.status_requests.lock().unwrap().clone()
    }

    pub fn status_count(&self, job_id: &str) -> usize {
        self.status_requests()
            .iter()
            .filter(|r| r.job_id == job_id)
            .count()
    }

    pub fn max_concurrent_posts(&self) -> usize {
        self.state.max_active_posts.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_status_per_job(&self) -> usize {
        self.state.max_status_per_job.load(Ordering::SeqCst)
    }
}

async fn submit(
    State(state): State<Arc<MockState>>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let active = state.active_posts.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_active_posts.fetch_max(active, Ordering::SeqCst);

    state.posts.lock().unwrap().push(RecordedPost {
        path: uri.path().to_string(),
        query,
        headers,
        body: body.to_vec(),
    });

    let delay = *state.submit_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let scripted = state.submit_replies.lock().unwrap().pop_front();
    let (code, body) = scripted.unwrap_or_else(|| {
        let n = state.id_counter.fetch_add(1, Ordering::SeqCst) + 1;
        (200, fixtures::submit_body(&format!("J{}", n)))
    });

    state.active_posts.fetch_sub(1, Ordering::SeqCst);
    (status_code(code), body)
}

async fn status(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let job_id = query.get("id").cloned().unwrap_or_default();
    state.status_requests.lock().unwrap().push(RecordedStatus {
        job_id: job_id.clone(),
        headers,
    });

    let (code, body) = {
        let mut scripts = state.status_scripts.lock().unwrap();
        let script = scripts.entry(job_id.clone()).or_default();
        script.in_flight += 1;
        state
            .max_status_per_job
            .fetch_max(script.in_flight, Ordering::SeqCst);

        match script.replies.pop_front() {
            Some(reply) => {
                script.last = Some(reply.clone());
                reply
            }
            None => script
                .last
                .clone()
                .unwrap_or_else(|| (200, fixtures::completed_body(&job_id))),
        }
    };

    // Give overlapping polls of the same job a chance to show up.
    tokio::time::sleep(Duration::from_millis(2)).await;

    if let Some(script) = state.status_scripts.lock().unwrap().get_mut(&job_id) {
        script.in_flight -= 1;
    }
    (status_code(code), body)
}

fn status_code(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
