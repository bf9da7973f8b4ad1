//! Orchestrator error types.

use thiserror::Error;

use reelgen_providers::ProviderError;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Errors returned synchronously from orchestrator calls.
///
/// Everything that happens after a job is registered surfaces through the
/// job's `status`/`error` fields instead, never through these variants.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("Request blocked by content policy: {0}")]
    ContentFiltered(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrchestratorError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn unsupported_model(model: impl Into<String>) -> Self {
        Self::UnsupportedModel(model.into())
    }

    pub fn provider_not_configured(provider: impl Into<String>) -> Self {
        Self::ProviderNotConfigured(provider.into())
    }

    pub fn not_found(job_id: impl Into<String>) -> Self {
        Self::NotFound(job_id.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<ProviderError> for OrchestratorError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => Self::ProviderNotConfigured(msg),
            ProviderError::ContentFiltered(msg) => Self::ContentFiltered(msg),
            ProviderError::Rejected(msg)
            | ProviderError::Network(msg)
            | ProviderError::UnexpectedResponse(msg) => Self::ProviderRejected(msg),
            ProviderError::DownloadFailed(msg) => Self::Internal(msg),
        }
    }
}
