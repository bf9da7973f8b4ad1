//! Video generation job lifecycle.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{GenerationRequest, Provider, StoredVideoResult, TenantContext};

/// Unique identifier for a generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a provider-namespaced random job ID.
    pub fn new(provider: Provider) -> Self {
        Self(format!("{}-{}", provider.as_str(), Uuid::new_v4()))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the provider, not yet rendering
    #[default]
    Queued,
    /// Provider is rendering
    InProgress,
    /// Media stored, result available
    Completed,
    /// Terminal failure, error populated
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Failure taxonomy for generation jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorCode {
    /// Request shape was unusable (empty prompt, bad parameters)
    InvalidRequest,
    /// Model identifier routes to no provider
    UnsupportedModel,
    /// Provider credential absent
    ProviderNotConfigured,
    /// Provider refused the creation call
    ProviderRejected,
    /// Provider moderation blocked the output
    ContentFiltered,
    /// Poll attempt budget exhausted without a terminal status
    PollTimeout,
    /// Generated media could not be retrieved
    DownloadFailed,
    /// Media retrieved but could not be stored
    PersistenceError,
}

impl JobErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobErrorCode::InvalidRequest => "invalid_request",
            JobErrorCode::UnsupportedModel => "unsupported_model",
            JobErrorCode::ProviderNotConfigured => "provider_not_configured",
            JobErrorCode::ProviderRejected => "provider_rejected",
            JobErrorCode::ContentFiltered => "content_filtered",
            JobErrorCode::PollTimeout => "poll_timeout",
            JobErrorCode::DownloadFailed => "download_failed",
            JobErrorCode::PersistenceError => "persistence_error",
        }
    }
}

/// Structured failure attached to a failed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobError {
    pub code: JobErrorCode,
    pub message: String,
}

impl JobError {
    pub fn new(code: JobErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

/// A video generation job tracked by the orchestrator.
///
/// `result` is populated iff the job completed; `error` iff it failed.
/// Terminal states are final.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoJob {
    /// Unique job ID
    pub id: JobId,

    /// Provider serving this job
    pub provider: Provider,

    /// Model identifier as submitted
    pub model: String,

    /// Prompt that drives generation (remix prompt for remixes)
    pub prompt: String,

    /// Output resolution, e.g. `1280x720`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Clip length in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<u32>,

    /// Aspect ratio, e.g. `16:9`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    /// Negative prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    /// Provider video id this job remixes, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remix_of: Option<String>,

    /// Lifecycle status
    #[serde(default)]
    pub status: JobStatus,

    /// Progress (0-100), when the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,

    /// Owning organization
    pub organization_id: String,

    /// Owning user
    pub user_id: String,

    /// Owner email, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,

    /// Submission timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Failure details (iff failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,

    /// Stored result (iff completed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StoredVideoResult>,

    /// Provider-internal polling handle (video id or operation name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_ref: Option<String>,
}

impl VideoJob {
    /// Register a new job for a routed request.
    pub fn new(provider: Provider, tenant: &TenantContext, request: &GenerationRequest) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(provider),
            provider,
            model: request.model.clone(),
            prompt: request.effective_prompt().to_string(),
            size: request.size.clone(),
            seconds: request.seconds,
            aspect_ratio: request.aspect_ratio.clone(),
            negative_prompt: request.negative_prompt.clone(),
            remix_of: request.remix_of.clone(),
            status: JobStatus::Queued,
            progress: None,
            organization_id: tenant.organization_id.clone(),
            user_id: tenant.user_id.clone(),
            user_email: tenant.user_email.clone(),
            created_at: now,
            updated_at: now,
            error: None,
            result: None,
            provider_ref: None,
        }
    }

    /// Attach the provider-internal polling handle.
    pub fn with_provider_ref(mut self, provider_ref: impl Into<String>) -> Self {
        self.provider_ref = Some(provider_ref.into());
        self.updated_at = Utc::now();
        self
    }

    /// Mark the job rendering. No-op once terminal.
    pub fn begin(mut self, progress: Option<u8>) -> Self {
        if self.status.is_terminal() {
            return self;
        }
        self.status = JobStatus::InProgress;
        if progress.is_some() {
            self.progress = progress.map(|p| p.min(100));
        }
        self.updated_at = Utc::now();
        self
    }

    /// Update progress. No-op once terminal.
    pub fn with_progress(mut self, progress: u8) -> Self {
        if self.status.is_terminal() {
            return self;
        }
        self.progress = Some(progress.min(100));
        self.updated_at = Utc::now();
        self
    }

    /// Mark completed with a stored result. No-op once terminal.
    pub fn complete(mut self, result: StoredVideoResult) -> Self {
        if self.status.is_terminal() {
            return self;
        }
        self.status = JobStatus::Completed;
        self.progress = Some(100);
        self.result = Some(result);
        self.updated_at = Utc::now();
        self
    }

    /// Mark failed. No-op once terminal.
    pub fn fail(mut self, error: JobError) -> Self {
        if self.status.is_terminal() {
            return self;
        }
        self.status = JobStatus::Failed;
        self.error = Some(error);
        self.updated_at = Utc::now();
        self
    }

    /// True when the given tenant owns this job.
    pub fn owned_by(&self, tenant: &TenantContext) -> bool {
        self.organization_id == tenant.organization_id && self.user_id == tenant.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> VideoJob {
        let tenant = TenantContext::new("org-1", "user-1");
        let request = GenerationRequest {
            prompt: "a red fox in the snow".to_string(),
            model: "sora-2".to_string(),
            ..Default::default()
        };
        VideoJob::new(Provider::OpenAi, &tenant, &request)
    }

    fn sample_result(job: &VideoJob) -> StoredVideoResult {
        StoredVideoResult {
            session_id: "1700000000000_deadbeef".to_string(),
            job_id: job.id.to_string(),
            video_id: Some("video_123".to_string()),
            remix_of: None,
            video_url: "https://cdn.example.com/api/files/v.mp4".to_string(),
            thumbnail_url: None,
            metadata_url: "https://cdn.example.com/api/files/m.json".to_string(),
            file_name: "v.mp4".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_job_id_is_provider_namespaced() {
        let id = JobId::new(Provider::Google);
        assert!(id.as_str().starts_with("google-"));
    }

    #[test]
    fn test_new_job_defaults() {
        let job = sample_job();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.result.is_none());
        assert!(job.error.is_none());
        assert!(job.id.as_str().starts_with("openai-"));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let job = sample_job().begin(Some(10));
        assert_eq!(job.status, JobStatus::InProgress);
        assert_eq!(job.progress, Some(10));

        let result = sample_result(&job);
        let done = job.complete(result);
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.progress, Some(100));
        assert!(done.result.is_some());
        assert!(done.error.is_none());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let job = sample_job();
        let failed = job.fail(JobError::new(JobErrorCode::PollTimeout, "gave up"));
        assert_eq!(failed.status, JobStatus::Failed);

        let result = sample_result(&failed);
        let still_failed = failed.complete(result);
        assert_eq!(still_failed.status, JobStatus::Failed);
        assert!(still_failed.result.is_none());
    }

    #[test]
    fn test_progress_is_clamped() {
        let job = sample_job().with_progress(250);
        assert_eq!(job.progress, Some(100));
    }

    #[test]
    fn test_ownership() {
        let job = sample_job();
        assert!(job.owned_by(&TenantContext::new("org-1", "user-1")));
        assert!(!job.owned_by(&TenantContext::new("org-1", "user-2")));
        assert!(!job.owned_by(&TenantContext::new("org-2", "user-1")));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&JobErrorCode::ContentFiltered).unwrap(),
            "\"content_filtered\""
        );
    }
}
