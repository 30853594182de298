//! In-process API tests with mocked source, transcoder and messenger.

mod common;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestFixture};

fn archive_names(path: &Path) -> Vec<String> {
    let mut zip = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}

async fn wait_until_gone(path: &Path) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while path.exists() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("file was not cleaned up");
}

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["config_hash"].as_str().unwrap().len(), 16);
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["telegram"]["bot_token_configured"], true);
    assert_eq!(response.body["fetcher"]["max_concurrent_downloads"], 3);
    assert_eq!(response.body["cleanup"]["delete_delay_secs"], 180);
    assert!(!response.text.contains("TEST-TOKEN"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Set lookup
// =============================================================================

#[tokio::test]
async fn test_get_set_uses_cache() {
    let fixture = TestFixture::new().await;
    fixture.seed_set("cats", 3).await;

    let first = fixture.get("/api/v1/sets/cats").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["name"], "cats");
    assert_eq!(first.body["title"], "cats stickers");
    assert_eq!(first.body["count"], 3);
    assert_eq!(first.body["kinds"]["static"], 3);
    assert_eq!(first.body["kinds"]["video"], 0);

    let second = fixture.get("/api/v1/sets/cats").await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(fixture.source.set_lookups(), 1);

    let stats = fixture.state.cache().stats().await;
    assert_eq!((stats.hits, stats.misses), (1, 1));
}

#[tokio::test]
async fn test_get_unknown_set_is_404() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/sets/missing").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_invalidate_set() {
    let fixture = TestFixture::new().await;
    fixture.seed_set("cats", 1).await;
    fixture.get("/api/v1/sets/cats").await;

    let response = fixture.delete("/api/v1/sets/cats").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["invalidated"], true);

    let response = fixture.delete("/api/v1/sets/cats").await;
    assert_eq!(response.body["invalidated"], false);

    fixture.get("/api/v1/sets/cats").await;
    assert_eq!(fixture.source.set_lookups(), 2);
}

// =============================================================================
// Archive creation
// =============================================================================

#[tokio::test]
async fn test_native_archive_without_chat() {
    let fixture = TestFixture::new().await;
    fixture.seed_set("cats", 3).await;

    let response = fixture
        .post("/api/v1/sets/cats/archive", json!({ "format": "native" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["set_name"], "cats");
    assert_eq!(response.body["format"], "native");
    assert_eq!(response.body["summary"]["total"], 3);
    assert_eq!(response.body["summary"]["ok"], 3);
    assert_eq!(response.body["summary"]["converted"], 0);
    assert!(response.body["failures"].as_array().unwrap().is_empty());
    assert!(response.body.get("message").is_none());
    assert!(response.body["delete_at"].is_string());

    let archive = PathBuf::from(response.body["archive_path"].as_str().unwrap());
    assert!(archive.starts_with(fixture.output_dir()));
    assert_eq!(archive_names(&archive), vec!["1.webp", "2.webp", "3.webp"]);

    assert!(fixture.messenger.sent_documents().await.is_empty());
    assert_eq!(fixture.state.cleanup().pending(), 1);
}

#[tokio::test]
async fn test_gif_archive_delivered_to_chat() {
    let fixture = TestFixture::new().await;
    fixture.seed_set("dogs", 2).await;

    let response = fixture
        .post(
            "/api/v1/sets/dogs/archive",
            json!({ "format": "gif", "chat_id": 4242 }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["summary"]["converted"], 2);
    assert_eq!(response.body["message"]["chat_id"], 4242);

    let archive = PathBuf::from(response.body["archive_path"].as_str().unwrap());
    assert_eq!(archive_names(&archive), vec!["1.gif", "2.gif"]);

    let sent = fixture.messenger.sent_documents().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].path, archive);
    assert_eq!(sent[0].caption, "dogs stickers");
    assert_eq!(fixture.transcoder.conversion_count().await, 2);
}

#[tokio::test]
async fn test_partial_failures_reported() {
    let fixture = TestFixture::new().await;
    fixture.source.add_set(fixtures::sticker_set("holes", 3)).await;
    fixture.source.add_file("file-1", fixtures::webp_bytes()).await;
    fixture
        .source
        .fail_always("file-2", || {
            stickerpack_core::SourceError::Forbidden("file is not accessible".into())
        })
        .await;
    fixture.source.add_file("file-3", fixtures::webp_bytes()).await;

    let response = fixture
        .post("/api/v1/sets/holes/archive", json!({ "format": "gif" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["summary"]["ok"], 2);
    assert_eq!(response.body["summary"]["failed"], 1);
    let failures = response.body["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["position"], 2);
    assert_eq!(failures[0]["asset_id"], "file-2");

    let archive = PathBuf::from(response.body["archive_path"].as_str().unwrap());
    assert_eq!(archive_names(&archive), vec!["1.gif", "3.gif"]);
}

#[tokio::test]
async fn test_delivery_failure_is_bad_gateway() {
    let fixture = TestFixture::new().await;
    fixture.seed_set("cats", 1).await;
    fixture.messenger.set_fail_sends(true);

    let response = fixture
        .post("/api/v1/sets/cats/archive", json!({ "chat_id": 1 }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("Failed to deliver archive"));
    // The undelivered archive is still scheduled for removal.
    assert_eq!(fixture.state.cleanup().pending(), 1);
}

#[tokio::test]
async fn test_invalid_set_name_is_bad_request() {
    let fixture = TestFixture::new().await;
    fixture
        .source
        .add_set(fixtures::sticker_set("bad\u{7}name", 1))
        .await;

    let response = fixture
        .post("/api/v1/sets/bad%07name/archive", json!({}))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(fixture.source.total_download_attempts().await, 0);
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let fixture = TestFixture::new().await;
    fixture.seed_set("cats", 1).await;

    let response = fixture
        .post_raw("/api/v1/sets/cats/archive", "{not json")
        .await;
    assert!(response.status.is_client_error());

    let response = fixture
        .post("/api/v1/sets/cats/archive", json!({ "format": "mp4" }))
        .await;
    assert!(response.status.is_client_error());
    assert_eq!(fixture.source.total_download_attempts().await, 0);
}

#[tokio::test]
async fn test_delivered_archive_cleaned_up_after_delay() {
    let fixture = TestFixture::with_delete_delay(0).await;
    fixture.seed_set("brief", 1).await;

    let response = fixture
        .post("/api/v1/sets/brief/archive", json!({ "chat_id": 99 }))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let archive = PathBuf::from(response.body["archive_path"].as_str().unwrap());
    wait_until_gone(&archive).await;

    tokio::time::timeout(Duration::from_secs(5), async {
        while fixture.messenger.deleted_messages().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("message was not deleted");
    assert_eq!(fixture.messenger.deleted_messages().await[0].chat_id, 99);
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.seed_set("metered", 1).await;
    fixture
        .post("/api/v1/sets/metered/archive", json!({}))
        .await;

    let response = fixture.get("/api/v1/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("stickerpack_http_requests_total"));
    assert!(response.text.contains("stickerpack_batches_total"));
    assert!(response.text.contains("stickerpack_cleanups_pending"));
}
