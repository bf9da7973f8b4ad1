//! Provider adapter seam.
//!
//! Each provider family implements this trait and normalizes its own
//! status vocabulary into the shared job lifecycle; nothing outside an
//! adapter interprets provider payloads.

use async_trait::async_trait;

use reelgen_models::{GenerationRequest, JobError, JobStatus, MediaPayload, Provider};

use crate::error::ProviderResult;

/// Outcome of a provider creation call.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Handle every later poll passes back (video id or operation name)
    pub provider_ref: String,
    /// Provider-assigned video id, when the provider reports one
    pub video_id: Option<String>,
    /// Status as reported at creation
    pub status: JobStatus,
    /// Progress as reported at creation
    pub progress: Option<u8>,
}

/// One observation of a running generation.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Still rendering
    Pending {
        status: JobStatus,
        progress: Option<u8>,
    },
    /// Render finished; media is ready for download
    Succeeded {
        video_id: Option<String>,
        /// Raw terminal response, kept for the metadata sidecar
        raw: serde_json::Value,
    },
    /// Provider-reported failure
    Failed { error: JobError },
}

/// Strategy trait over the supported provider families.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter serves.
    fn provider(&self) -> Provider;

    /// Whether the credential needed to call the provider is present.
    fn is_configured(&self) -> bool;

    /// Start a generation job.
    async fn submit(&self, request: &GenerationRequest) -> ProviderResult<Submission>;

    /// Re-observe a job by its provider handle. Never re-submits.
    async fn poll(&self, provider_ref: &str) -> ProviderResult<PollOutcome>;

    /// Download the finished video.
    async fn download_video(&self, provider_ref: &str) -> ProviderResult<MediaPayload>;

    /// Download the thumbnail. `Ok(None)` when the provider renders none.
    async fn download_thumbnail(&self, provider_ref: &str)
        -> ProviderResult<Option<MediaPayload>>;
}
