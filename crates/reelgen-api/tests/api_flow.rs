//! End-to-end flow tests against the built router.
//!
//! The provider sits behind a wiremock server and the blob backend is a
//! tempdir, so the full submit/poll/persist/deliver path runs for real.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reelgen_api::{create_router, ApiConfig, AppState};
use reelgen_orchestrator::{InMemoryJobStore, JobOrchestrator, OrchestratorConfig};
use reelgen_providers::{ProviderAdapter, SoraClient};
use reelgen_storage::{
    ArchiveIndexer, AssetStore, BlobStore, LocalBlobStore, StorageBackendKind, StorageConfig,
};

const ROOT: &str = "generated-videos";
const BASE: &str = "http://localhost:8000";

fn build_app(dir: &TempDir, sora_base: &str) -> axum::Router {
    let storage: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(dir.path()));
    let assets = Arc::new(AssetStore::new(Arc::clone(&storage), ROOT, BASE));
    let archive = Arc::new(ArchiveIndexer::new(Arc::clone(&storage), ROOT, BASE));

    let sora = SoraClient::new("test-key")
        .unwrap()
        .with_base_url(sora_base);
    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![Arc::new(sora)];

    let orchestrator = Arc::new(JobOrchestrator::new(
        OrchestratorConfig {
            poll_interval: Duration::from_millis(50),
            max_poll_attempts: 20,
            retention: Duration::from_secs(3600),
        },
        Arc::new(InMemoryJobStore::new()),
        adapters,
        assets,
    ));

    let state = AppState {
        config: ApiConfig::default(),
        storage_config: StorageConfig {
            backend: StorageBackendKind::Local,
            root_prefix: ROOT.to_string(),
            public_base_url: BASE.to_string(),
            local_root: dir.path().display().to_string(),
        },
        storage,
        orchestrator,
        archive,
    };

    create_router(state, None)
}

fn identified(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder
        .header("x-organization-id", "org-1")
        .header("x-user-id", "user-1")
        .header("x-user-email", "dev@example.com")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn mount_happy_sora(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "video_e2e",
            "status": "queued"
        })))
        .mount(server)
        .await;

    // Thumbnail first: its matcher is more specific than the content mock
    Mock::given(method("GET"))
        .and(path("/videos/video_e2e/content"))
        .and(query_param("variant", "thumbnail"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"thumb bytes".to_vec()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/videos/video_e2e/content"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4 bytes".to_vec()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/videos/video_e2e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "video_e2e",
            "status": "completed"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_generate_poll_and_download_flow() {
    let server = MockServer::start().await;
    mount_happy_sora(&server).await;

    let dir = TempDir::new().unwrap();
    let app = build_app(&dir, &server.uri());

    // Submit
    let request = identified(Request::builder().method("POST").uri("/api/videos/generate"))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "prompt": "a red fox in the snow", "model": "sora-2" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let job = body_json(response).await;
    let job_id = job["id"].as_str().unwrap().to_string();
    assert!(job["status"] == "queued" || job["status"] == "in_progress");
    assert!(job.get("result").is_none());

    // Poll until terminal
    let mut done = None;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(50)).await;

        let request = identified(
            Request::builder().uri(format!("/api/videos/jobs/{}", job_id)),
        )
        .body(Body::empty())
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let job = body_json(response).await;
        if job["status"] == "completed" || job["status"] == "failed" {
            done = Some(job);
            break;
        }
    }
    let job = done.expect("job never reached a terminal state");
    assert_eq!(job["status"], "completed");

    // The stored video resolves through the file delivery route
    let file_name = job["result"]["file_name"].as_str().unwrap();
    assert!(job["result"]["video_url"]
        .as_str()
        .unwrap()
        .ends_with(file_name));

    let request = identified(Request::builder().uri(format!("/api/files/{}", file_name)))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "video/mp4");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"mp4 bytes");

    // Recent listing sees the finished job
    let request = identified(Request::builder().uri("/api/videos/recent"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let recent = body_json(response).await;
    assert_eq!(recent["count"], 1);

    // The archive reconstructs the session from storage, job id included
    let request = identified(Request::builder().uri("/api/videos/archive"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let archive = body_json(response).await;
    assert_eq!(archive["pagination"]["total"], 1);
    assert_eq!(archive["videos"][0]["job_id"], job_id);
    assert!(archive["videos"][0]["thumbnail_url"].is_string());
}

#[tokio::test]
async fn test_moderation_rejection_maps_to_400() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": "moderation_blocked",
                "message": "Request was rejected by the moderation system"
            }
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let app = build_app(&dir, &server.uri());

    let request = identified(Request::builder().method("POST").uri("/api/videos/generate"))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "prompt": "something disallowed", "model": "sora-2" }).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("content policy"));
}

#[tokio::test]
async fn test_cross_tenant_status_is_403() {
    let server = MockServer::start().await;
    mount_happy_sora(&server).await;

    let dir = TempDir::new().unwrap();
    let app = build_app(&dir, &server.uri());

    let request = identified(Request::builder().method("POST").uri("/api/videos/generate"))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "prompt": "a red fox", "model": "sora-2" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let job = body_json(response).await;
    let job_id = job["id"].as_str().unwrap();

    let request = Request::builder()
        .uri(format!("/api/videos/jobs/{}", job_id))
        .header("x-organization-id", "org-2")
        .header("x-user-id", "user-2")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
