//! Common test utilities for in-process API testing with mocks.
//!
//! Builds the real router over an `AppState` whose source, transcoder and
//! messenger are the core's mocks, so whole archive requests run without
//! network access or ffmpeg.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use stickerpack_core::{
    load_config_from_str, BatchOrchestrator, CleanupScheduler, DownloadPool, Fetcher, GifOptions,
    testing::{MockMessenger, MockStickerSource, MockTranscoder},
};
use stickerpack_server::state::AppState;

/// Re-export fixtures for test convenience
pub use stickerpack_core::testing::fixtures;

/// Test fixture wiring the router to controllable mocks.
pub struct TestFixture {
    pub router: Router,
    pub state: Arc<AppState>,
    pub source: MockStickerSource,
    pub transcoder: MockTranscoder,
    pub messenger: MockMessenger,
    /// Holds the output directory alive for the test's duration
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a fixture with a 180s cleanup delay.
    pub async fn new() -> Self {
        Self::with_delete_delay(180).await
    }

    pub async fn with_delete_delay(delete_delay_secs: u64) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_dir = temp_dir.path().join("download");

        let config = load_config_from_str(&format!(
            r#"
[telegram]
bot_token = "123456:TEST-TOKEN"

[server]
host = "127.0.0.1"
port = 8080

[fetcher]
output_dir = "{}"
max_concurrent_downloads = 3
backoff_unit_ms = 1

[cleanup]
delete_delay_secs = {}

[cache]
sticker_sets = 4
"#,
            output_dir.display(),
            delete_delay_secs
        ))
        .expect("Failed to parse test config");

        let source = MockStickerSource::new();
        let transcoder = MockTranscoder::new();
        let messenger = MockMessenger::new();

        let fetcher = Fetcher::new(
            Arc::new(source.clone()),
            Arc::new(transcoder.clone()),
            DownloadPool::new(config.fetcher.max_concurrent_downloads),
            config.fetcher.clone(),
            GifOptions::from(&config.transcoder),
        );
        let cleanup = CleanupScheduler::new(Some(Arc::new(messenger.clone())));

        let state = Arc::new(AppState::new(
            config,
            Arc::new(source.clone()),
            Arc::new(messenger.clone()),
            BatchOrchestrator::new(fetcher),
            cleanup,
        ));
        let router = stickerpack_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            source,
            transcoder,
            messenger,
            temp_dir,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("download")
    }

    /// Seed a set of `count` static stickers with downloadable files.
    pub async fn seed_set(&self, name: &str, count: usize) {
        self.source.add_set(fixtures::sticker_set(name, count)).await;
        for id in fixtures::file_ids(count) {
            self.source.add_file(&id, fixtures::webp_bytes()).await;
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
