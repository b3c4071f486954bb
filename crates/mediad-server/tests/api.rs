//! Router-level tests: HTTP payloads, status codes, and the end-to-end
//! submit → poll → fetch flow against a mock extractor.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

use mediad_core::config::MediadConfig;
use mediad_core::extract::{
    ExtractError, Extraction, MediaExtractor, MediaKind, RequestProfile,
};
use mediad_core::jobs::Orchestrator;
use mediad_server::app::{router, AppState};

const BODY_LIMIT: usize = 1024 * 1024;

fn test_config() -> MediadConfig {
    let mut cfg = MediadConfig::default();
    cfg.pacing.min_gap_secs = 0;
    cfg.pacing.gap_jitter_ms = (0, 0);
    cfg.pacing.start_jitter_ms = (0, 0);
    cfg.pacing.cooldown_secs = (0, 0);
    cfg.pacing.burst_limit = 10_000;
    cfg
}

/// Writes `clip42.mp4` into the output dir and declares it.
struct FileExtractor {
    dir: PathBuf,
}

#[async_trait]
impl MediaExtractor for FileExtractor {
    async fn extract(
        &self,
        _url: &str,
        _kind: MediaKind,
        _profile: &RequestProfile,
    ) -> Result<Extraction, ExtractError> {
        let path = self.dir.join("clip42.mp4");
        std::fs::write(&path, b"media bytes").unwrap();
        Ok(Extraction {
            declared_path: path,
            media_id: "clip42".to_string(),
            title: Some("A Clip".to_string()),
            thumbnail: None,
            duration_secs: Some(3.0),
            uploader: None,
        })
    }
}

/// Never finishes; used to pin jobs in the Running state.
struct StuckExtractor;

#[async_trait]
impl MediaExtractor for StuckExtractor {
    async fn extract(
        &self,
        _url: &str,
        _kind: MediaKind,
        _profile: &RequestProfile,
    ) -> Result<Extraction, ExtractError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(ExtractError::Failed("unreachable".to_string()))
    }
}

fn test_app(extractor: impl MediaExtractor + 'static, dir: &Path) -> Router {
    let orchestrator = Orchestrator::new(&test_config(), Arc::new(extractor), dir.to_path_buf());
    router(AppState { orchestrator })
}

fn post_download(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/download")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn poll_until_terminal(app: &Router, job_id: &str) -> Value {
    for _ in 0..500 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/download/status/{job_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let status = body["status"].as_str().unwrap();
        if status == "succeeded" || status == "failed" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached a terminal state");
}

#[tokio::test]
async fn missing_fields_are_rejected_with_400() {
    let dir = tempdir().unwrap();
    let app = test_app(StuckExtractor, dir.path());

    let response = app
        .clone()
        .oneshot(post_download(json!({ "url": "https://youtu.be/abc" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("mediaKind"));

    let response = app
        .oneshot(post_download(json!({ "mediaKind": "video" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_media_kind_and_url_are_rejected() {
    let dir = tempdir().unwrap();
    let app = test_app(StuckExtractor, dir.path());

    let response = app
        .clone()
        .oneshot(post_download(
            json!({ "url": "https://youtu.be/abc", "mediaKind": "gif" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(post_download(
            json!({ "url": "not a url", "mediaKind": "video" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_download(
            json!({ "url": "ftp://example.com/f", "mediaKind": "video" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_poll_fetch_roundtrip() {
    let dir = tempdir().unwrap();
    let app = test_app(
        FileExtractor {
            dir: dir.path().to_path_buf(),
        },
        dir.path(),
    );

    let response = app
        .clone()
        .oneshot(post_download(
            json!({ "url": "https://youtu.be/abc123", "mediaKind": "video" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let status = poll_until_terminal(&app, &job_id).await;
    assert_eq!(status["status"], "succeeded");
    let download_url = status["downloadUrl"].as_str().unwrap().to_string();
    assert_eq!(download_url, format!("/api/download/file/{job_id}"));

    let response = app
        .oneshot(
            Request::builder()
                .uri(download_url)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("clip42.mp4"));
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"media bytes");
}

#[tokio::test]
async fn admission_rejection_maps_to_429_naming_the_domain() {
    let dir = tempdir().unwrap();
    let app = test_app(StuckExtractor, dir.path());

    for i in 0..2 {
        let response = app
            .clone()
            .oneshot(post_download(json!({
                "url": format!("https://www.tiktok.com/@u/video/{i}"),
                "mediaKind": "audio"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    // Third concurrent tiktok job exceeds the per-domain cap.
    let response = app
        .oneshot(post_download(json!({
            "url": "https://www.tiktok.com/@u/video/3",
            "mediaKind": "audio"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("tiktok"));
}

#[tokio::test]
async fn status_and_file_for_unknown_job_are_404() {
    let dir = tempdir().unwrap();
    let app = test_app(StuckExtractor, dir.path());
    let id = uuid::Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/download/status/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/download/file/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn file_for_unfinished_job_is_400() {
    let dir = tempdir().unwrap();
    let app = test_app(StuckExtractor, dir.path());

    let response = app
        .clone()
        .oneshot(post_download(
            json!({ "url": "https://youtu.be/abc", "mediaKind": "video" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let job_id = json_body(response).await["jobId"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/download/file/{job_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("not ready"));
}
