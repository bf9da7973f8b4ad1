//! Archive listing handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use reelgen_models::{ArchivedVideoEntry, Pagination};
use reelgen_storage::DEFAULT_PAGE_LIMIT;

use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Archive list query params.
#[derive(Deserialize)]
pub struct ArchiveQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Archive list response.
#[derive(Serialize)]
pub struct ArchiveResponse {
    pub videos: Vec<ArchivedVideoEntry>,
    pub pagination: Pagination,
}

/// List the caller's stored generations, newest first.
///
/// Reconstructed from the blob store, so it also covers videos produced
/// by previous process lifetimes.
pub async fn list_archive(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Query(query): Query<ArchiveQuery>,
) -> ApiResult<Json<ArchiveResponse>> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let (videos, pagination) = state.archive.list(&identity.0, page, limit).await?;
    Ok(Json(ArchiveResponse { videos, pagination }))
}
