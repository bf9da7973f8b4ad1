//! OpenAI Sora video generation adapter.
//!
//! Drives the `/v1/videos` job API: create (or remix) a video job, poll
//! the video object until terminal, then fetch rendered content. A
//! reference image rides along as a multipart `input_reference` part.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use reelgen_models::{
    GenerationRequest, JobError, JobErrorCode, JobStatus, MediaPayload, Provider, ReferenceImage,
};

use crate::adapter::{PollOutcome, ProviderAdapter, Submission};
use crate::error::{ProviderError, ProviderResult};

/// Default base URL for the OpenAI API.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Request timeout, sized for video content downloads.
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Appended to moderation failures so callers see actionable text.
const MODERATION_GUIDANCE: &str = "OpenAI's content policy blocked this request. \
Rework the prompt to avoid real people, trademarked characters, graphic violence \
or adult themes, then submit again.";

// =============================================================================
// API request/response types
// =============================================================================

#[derive(Debug, Serialize)]
struct CreateVideoRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seconds: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<String>,
}

#[derive(Debug, Serialize)]
struct RemixVideoRequest {
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct VideoObject {
    id: String,
    status: String,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    error: Option<VideoErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
struct VideoErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: Option<VideoErrorDetail>,
}

// =============================================================================
// SoraClient
// =============================================================================

/// Adapter for OpenAI's Sora video jobs API.
pub struct SoraClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for SoraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoraClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SoraClient {
    /// Create a new client. An empty key yields an unconfigured adapter.
    pub fn new(api_key: impl Into<String>) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| {
                ProviderError::not_configured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(std::env::var("OPENAI_API_KEY").unwrap_or_default())
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn videos_url(&self) -> String {
        format!("{}/videos", self.base_url)
    }

    fn video_url(&self, id: &str) -> String {
        format!("{}/videos/{}", self.base_url, id)
    }

    fn remix_url(&self, id: &str) -> String {
        format!("{}/videos/{}/remix", self.base_url, id)
    }

    fn content_url(&self, id: &str) -> String {
        format!("{}/videos/{}/content", self.base_url, id)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    fn map_status(status: &str) -> JobStatus {
        match status {
            "queued" => JobStatus::Queued,
            "in_progress" => JobStatus::InProgress,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            other => {
                warn!("Unknown Sora video status: {}", other);
                JobStatus::InProgress
            }
        }
    }

    /// Parse a non-success HTTP response body.
    fn parse_api_error(status: StatusCode, body: &str) -> ProviderError {
        if let Ok(envelope) = serde_json::from_str::<ApiErrorResponse>(body) {
            if let Some(detail) = envelope.error {
                let code = detail.code.unwrap_or_default();
                let message = detail.message.unwrap_or_default();
                if is_moderation_code(&code) {
                    return ProviderError::content_filtered(format!(
                        "{} {}",
                        message, MODERATION_GUIDANCE
                    ));
                }
                return ProviderError::rejected(format!(
                    "OpenAI API error ({}): {} (code: {})",
                    status, message, code
                ));
            }
        }

        let truncated: String = body.chars().take(500).collect();
        ProviderError::rejected(format!("OpenAI API error ({}): {}", status, truncated))
    }

    /// Translate a failed video object into a job error.
    fn failure_error(detail: Option<VideoErrorDetail>) -> JobError {
        let code = detail
            .as_ref()
            .and_then(|d| d.code.clone())
            .unwrap_or_default();
        let message = detail
            .and_then(|d| d.message)
            .unwrap_or_else(|| "Video generation failed".to_string());

        if is_moderation_code(&code) {
            JobError::new(
                JobErrorCode::ContentFiltered,
                format!("{} {}", message, MODERATION_GUIDANCE),
            )
        } else if code.is_empty() {
            JobError::new(JobErrorCode::ProviderRejected, message)
        } else {
            JobError::new(
                JobErrorCode::ProviderRejected,
                format!("{} (code: {})", message, code),
            )
        }
    }

    async fn read_success(response: reqwest::Response) -> ProviderResult<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_api_error(status, &body));
        }
        Ok(body)
    }

    async fn create_json(&self, request: &GenerationRequest) -> ProviderResult<String> {
        let body = CreateVideoRequest {
            model: request.model.clone(),
            prompt: request.effective_prompt().to_string(),
            seconds: request.seconds.map(|s| s.to_string()),
            size: request.size.clone(),
        };

        let response = self
            .client
            .post(self.videos_url())
            .header("Authorization", self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("Network error: {}", e)))?;

        Self::read_success(response).await
    }

    async fn create_with_reference(
        &self,
        request: &GenerationRequest,
        image: &ReferenceImage,
    ) -> ProviderResult<String> {
        let bytes = BASE64.decode(image.data.as_bytes()).map_err(|e| {
            ProviderError::rejected(format!("Invalid reference image encoding: {}", e))
        })?;

        let part = Part::bytes(bytes)
            .file_name(reference_file_name(&image.mime_type))
            .mime_str(&image.mime_type)
            .map_err(|e| {
                ProviderError::rejected(format!("Invalid reference image type: {}", e))
            })?;

        let mut form = Form::new()
            .text("model", request.model.clone())
            .text("prompt", request.effective_prompt().to_string())
            .part("input_reference", part);
        if let Some(seconds) = request.seconds {
            form = form.text("seconds", seconds.to_string());
        }
        if let Some(size) = &request.size {
            form = form.text("size", size.clone());
        }

        let response = self
            .client
            .post(self.videos_url())
            .header("Authorization", self.bearer())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("Network error: {}", e)))?;

        Self::read_success(response).await
    }

    async fn create_remix(
        &self,
        source_video_id: &str,
        request: &GenerationRequest,
    ) -> ProviderResult<String> {
        let body = RemixVideoRequest {
            prompt: request.effective_prompt().to_string(),
        };

        let response = self
            .client
            .post(self.remix_url(source_video_id))
            .header("Authorization", self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("Network error: {}", e)))?;

        Self::read_success(response).await
    }

    async fn fetch_bytes(&self, url: String) -> ProviderResult<Vec<u8>> {
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| ProviderError::download(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::download(format!(
                "Content download failed with status {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::download(format!("Failed to read content: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

fn is_moderation_code(code: &str) -> bool {
    matches!(
        code,
        "moderation_blocked" | "content_policy_violation" | "input_moderation"
    )
}

fn reference_file_name(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "reference.jpg",
        "image/webp" => "reference.webp",
        _ => "reference.png",
    }
}

fn as_percent(progress: f64) -> u8 {
    progress.clamp(0.0, 100.0).round() as u8
}

#[async_trait]
impl ProviderAdapter for SoraClient {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn submit(&self, request: &GenerationRequest) -> ProviderResult<Submission> {
        let body = if let Some(remix_of) = &request.remix_of {
            self.create_remix(remix_of, request).await?
        } else if let Some(image) = &request.reference_image {
            self.create_with_reference(request, image).await?
        } else {
            self.create_json(request).await?
        };

        let video: VideoObject = serde_json::from_str(&body)
            .map_err(|e| ProviderError::unexpected(format!("Failed to parse response: {}", e)))?;

        debug!("Sora video created: id={} status={}", video.id, video.status);

        Ok(Submission {
            provider_ref: video.id.clone(),
            video_id: Some(video.id),
            status: Self::map_status(&video.status),
            progress: video.progress.map(as_percent),
        })
    }

    async fn poll(&self, provider_ref: &str) -> ProviderResult<PollOutcome> {
        let response = self
            .client
            .get(self.video_url(provider_ref))
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("Network error: {}", e)))?;

        let body = Self::read_success(response).await?;
        let raw: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            ProviderError::unexpected(format!("Failed to parse poll response: {}", e))
        })?;
        let video: VideoObject = serde_json::from_value(raw.clone()).map_err(|e| {
            ProviderError::unexpected(format!("Failed to parse poll response: {}", e))
        })?;

        debug!("Sora poll for {}: status={}", provider_ref, video.status);

        match video.status.as_str() {
            "completed" => Ok(PollOutcome::Succeeded {
                video_id: Some(video.id),
                raw,
            }),
            "failed" => Ok(PollOutcome::Failed {
                error: Self::failure_error(video.error),
            }),
            other => Ok(PollOutcome::Pending {
                status: Self::map_status(other),
                progress: video.progress.map(as_percent),
            }),
        }
    }

    async fn download_video(&self, provider_ref: &str) -> ProviderResult<MediaPayload> {
        let bytes = self.fetch_bytes(self.content_url(provider_ref)).await?;
        Ok(MediaPayload::mp4(bytes))
    }

    async fn download_thumbnail(
        &self,
        provider_ref: &str,
    ) -> ProviderResult<Option<MediaPayload>> {
        let url = format!("{}?variant=thumbnail", self.content_url(provider_ref));
        let bytes = self.fetch_bytes(url).await?;
        Ok(Some(MediaPayload::webp(bytes)))
    }
}

// =============================================================================
// Tests
// =============================================================================
