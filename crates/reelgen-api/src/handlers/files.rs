//! Stored file delivery.
//!
//! Every URL in job results and archive entries resolves here: a
//! tenant-scoped fetch by filename, independent of which blob backend
//! holds the bytes.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use reelgen_storage::naming;

use crate::error::ApiError;
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Fetch a stored asset owned by the caller.
pub async fn get_file(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(file_name): Path<String>,
) -> Result<Response, ApiError> {
    if !is_valid_file_name(&file_name) {
        return Err(ApiError::bad_request("Invalid file name"));
    }

    let key = format!(
        "{}{}",
        naming::tenant_prefix(
            &state.storage_config.root_prefix,
            &identity.0.organization_id,
            &identity.0.user_id,
        ),
        file_name
    );

    let bytes = match state.storage.get(&key).await {
        Ok(bytes) => bytes,
        Err(e) if e.is_not_found() => {
            return Err(ApiError::not_found(format!("File not found: {}", file_name)))
        }
        Err(e) => return Err(e.into()),
    };

    let content_type = naming::content_type_for_name(&file_name);

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        bytes,
    )
        .into_response())
}

/// Validate a stored file name (no separators, no traversal).
fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 256
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
}
