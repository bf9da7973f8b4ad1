//! Video generation handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use reelgen_models::{GenerationRequest, JobId, VideoJob};

use crate::error::{ApiError, ApiResult};
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Recent jobs response.
#[derive(Serialize)]
pub struct RecentJobsResponse {
    pub jobs: Vec<VideoJob>,
    pub count: usize,
}

/// Submit a generation job.
///
/// Returns 201 with the registered job; generation continues in the
/// background and is observed by polling the status endpoint.
pub async fn generate_video(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Json(request): Json<GenerationRequest>,
) -> ApiResult<(StatusCode, Json<VideoJob>)> {
    info!(
        "Generation request: model={} org={}",
        request.model, identity.0.organization_id
    );

    let job = state.orchestrator.submit(&identity.0, &request).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// Poll a job's status.
pub async fn get_job_status(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(job_id): Path<String>,
) -> ApiResult<Json<VideoJob>> {
    if !is_valid_job_id(&job_id) {
        return Err(ApiError::bad_request("Invalid job ID format"));
    }

    let job = state
        .orchestrator
        .get_status(&identity.0, &JobId::from_string(job_id))
        .await?;
    Ok(Json(job))
}

/// List the caller's jobs still in the live registry.
pub async fn list_recent_jobs(
    State(state): State<AppState>,
    identity: CallerIdentity,
) -> ApiResult<Json<RecentJobsResponse>> {
    let jobs = state.orchestrator.list_recent(&identity.0).await;
    let count = jobs.len();
    Ok(Json(RecentJobsResponse { jobs, count }))
}

/// Validate job ID format to prevent injection attacks.
fn is_valid_job_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 100
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
