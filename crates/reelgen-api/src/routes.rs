//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::archive::list_archive;
use crate::handlers::files::get_file;
use crate::handlers::generation::{generate_video, get_job_status, list_recent_jobs};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let video_routes = Router::new()
        .route("/videos/generate", post(generate_video))
        .route("/videos/jobs/:job_id", get(get_job_status))
        .route("/videos/recent", get(list_recent_jobs))
        .route("/videos/archive", get(list_archive));

    let file_routes = Router::new().route("/files/:file_name", get(get_file));

    let rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(video_routes)
        .merge(file_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use reelgen_orchestrator::{InMemoryJobStore, JobOrchestrator, OrchestratorConfig};
    use reelgen_storage::{
        ArchiveIndexer, AssetStore, BlobStore, LocalBlobStore, StorageBackendKind, StorageConfig,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const ROOT: &str = "generated-videos";
    const BASE: &str = "http://localhost:8000";

    fn test_state(dir: &TempDir) -> AppState {
        let storage: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(dir.path()));
        let assets = Arc::new(AssetStore::new(Arc::clone(&storage), ROOT, BASE));
        let archive = Arc::new(ArchiveIndexer::new(Arc::clone(&storage), ROOT, BASE));

        // No adapters registered: submissions fail with a config error
        let orchestrator = Arc::new(JobOrchestrator::new(
            OrchestratorConfig::default(),
            Arc::new(InMemoryJobStore::new()),
            vec![],
            assets,
        ));

        AppState {
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
        }
    }

    fn identified(builder: axum::http::request::Builder) -> axum::http::request::Builder {
        builder
            .header("x-organization-id", "org-1")
            .header("x-user-id", "user-1")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir), None);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_generate_requires_identity() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir), None);

        let request = Request::builder()
            .method("POST")
            .uri("/api/videos/generate")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "prompt": "a fox", "model": "sora-2" }).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_generate_unknown_model_is_400() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir), None);

        let request = identified(Request::builder().method("POST").uri("/api/videos/generate"))
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "prompt": "a fox", "model": "dall-e-3" }).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("dall-e-3"));
    }

    #[tokio::test]
    async fn test_generate_without_adapter_is_503() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir), None);

        let request = identified(Request::builder().method("POST").uri("/api/videos/generate"))
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "prompt": "a fox", "model": "sora-2" }).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_job_status_unknown_is_404() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir), None);

        let request = identified(
            Request::builder().uri("/api/videos/jobs/openai-00000000-0000-0000-0000-000000000000"),
        )
        .body(Body::empty())
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_recent_jobs_empty() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir), None);

        let request = identified(Request::builder().uri("/api/videos/recent"))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_archive_lists_seeded_session() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        state
            .storage
            .put(
                "generated-videos/org-1/user-1/1730000000000_abcd1234_openai_sora-2.mp4",
                b"video".to_vec(),
                "video/mp4",
            )
            .await
            .unwrap();

        let app = create_router(state, None);
        let request = identified(Request::builder().uri("/api/videos/archive?page=1&limit=10"))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["pagination"]["total"], 1);
        assert_eq!(body["videos"][0]["session_id"], "1730000000000_abcd1234");
    }

    #[tokio::test]
    async fn test_file_delivery_is_tenant_scoped() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        state
            .storage
            .put(
                "generated-videos/org-1/user-1/1730000000000_abcd1234_openai_sora-2.mp4",
                b"video bytes".to_vec(),
                "video/mp4",
            )
            .await
            .unwrap();

        let app = create_router(state, None);

        let request = identified(
            Request::builder().uri("/api/files/1730000000000_abcd1234_openai_sora-2.mp4"),
        )
        .body(Body::empty())
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "video/mp4"
        );

        // Another tenant's prefix does not contain the file
        let request = Request::builder()
            .uri("/api/files/1730000000000_abcd1234_openai_sora-2.mp4")
            .header("x-organization-id", "org-2")
            .header("x-user-id", "user-2")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_file_name_traversal_is_rejected() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir), None);

        let request = identified(Request::builder().uri("/api/files/..%2Fsecrets"))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
