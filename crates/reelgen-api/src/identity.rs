//! Caller identity extraction.
//!
//! Authentication happens upstream (gateway / edge); by the time a request
//! reaches this service the caller's organization and user identifiers are
//! carried in trusted headers. The extractor turns them into a
//! `TenantContext` and rejects requests that arrive without them.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use reelgen_models::TenantContext;

use crate::error::ApiError;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";
pub const USER_HEADER: &str = "x-user-id";
pub const EMAIL_HEADER: &str = "x-user-email";

const MAX_IDENTIFIER_LEN: usize = 128;

/// The authenticated caller, resolved from trusted identity headers.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub TenantContext);

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let organization_id = required_header(parts, ORGANIZATION_HEADER)?;
        let user_id = required_header(parts, USER_HEADER)?;

        let user_email = parts
            .headers
            .get(EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let mut tenant = TenantContext::new(organization_id, user_id);
        if let Some(email) = user_email {
            tenant = tenant.with_email(email);
        }
        Ok(CallerIdentity(tenant))
    }
}

fn required_header(parts: &Parts, name: &str) -> Result<String, ApiError> {
    let value = parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::unauthorized(format!("Missing identity header: {}", name)))?;

    // Identifiers end up in storage keys; keep them to a safe alphabet
    if !is_valid_identifier(value) {
        return Err(ApiError::unauthorized(format!(
            "Invalid identity header: {}",
            name
        )));
    }
    Ok(value.to_string())
}

/// Validate an org/user identifier (alphanumeric, hyphen, underscore).
fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_IDENTIFIER_LEN
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
