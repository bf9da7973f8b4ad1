//! Google Veo video generation adapter.
//!
//! Talks to the Generative Language API's long-running operation surface:
//! `models/{model}:predictLongRunning` starts a generation, operation GETs
//! report progress until `done`, and the finished operation carries the
//! sample URI the video is downloaded from.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use reelgen_models::{GenerationRequest, JobError, JobErrorCode, JobStatus, MediaPayload, Provider};

use crate::adapter::{PollOutcome, ProviderAdapter, Submission};
use crate::error::{ProviderError, ProviderResult};

/// Default base URL for the Generative Language API.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Request timeout, sized for video content downloads.
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Appended to safety-filter failures so callers see actionable text.
const RAI_FILTER_GUIDANCE: &str = "Google's responsible AI filters removed the \
generated video. Adjust the prompt to avoid depicting real people, children or \
unsafe content, then try again.";

/// Operation metadata keys that have been observed to carry progress.
const PROGRESS_KEYS: [&str; 3] = ["progressPercent", "progressPercentage", "percentComplete"];

// =============================================================================
// API request/response types
// =============================================================================

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<InlineImage>,
}

#[derive(Debug, Serialize)]
struct InlineImage {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64_encoded: String,
    #[serde(rename = "mimeType")]
    mime_type: String,
}

#[derive(Debug, Serialize)]
struct Parameters {
    #[serde(rename = "aspectRatio", skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
    #[serde(rename = "negativePrompt", skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    #[serde(rename = "generateVideoResponse", default)]
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
struct GenerateVideoResponse {
    #[serde(rename = "raiMediaFilteredCount", default)]
    rai_media_filtered_count: u32,
    #[serde(rename = "raiMediaFilteredReasons", default)]
    rai_media_filtered_reasons: Vec<String>,
    #[serde(rename = "generatedSamples", default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    #[serde(default)]
    video: Option<SampleVideo>,
}

#[derive(Debug, Deserialize)]
struct SampleVideo {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

// =============================================================================
// VeoClient
// =============================================================================

/// Adapter for Google's Veo long-running operation API.
pub struct VeoClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for VeoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VeoClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl VeoClient {
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

    /// Create from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(std::env::var("GEMINI_API_KEY").unwrap_or_default())
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn predict_url(&self, model: &str) -> String {
        format!("{}/models/{}:predictLongRunning", self.base_url, model)
    }

    // Operation names already carry their resource path, e.g.
    // "models/veo-3.0-generate-001/operations/abc123".
    fn operation_url(&self, operation_name: &str) -> String {
        format!("{}/{}", self.base_url, operation_name)
    }

    fn parse_api_error(status: StatusCode, body: &str) -> ProviderError {
        if let Ok(envelope) = serde_json::from_str::<ApiErrorResponse>(body) {
            if let Some(detail) = envelope.error {
                let message = detail.message.unwrap_or_default();
                let mut rendered = format!("Google API error ({}): {}", status, message);
                if let Some(api_status) = detail.status.filter(|s| !s.is_empty()) {
                    rendered.push_str(&format!(" [{}]", api_status));
                }
                return ProviderError::rejected(rendered);
            }
        }

        let truncated: String = body.chars().take(500).collect();
        ProviderError::rejected(format!("Google API error ({}): {}", status, truncated))
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

    async fn fetch_operation(
        &self,
        operation_name: &str,
    ) -> ProviderResult<(Operation, serde_json::Value)> {
        let response = self
            .client
            .get(self.operation_url(operation_name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("Network error: {}", e)))?;

        let body = Self::read_success(response).await?;
        let raw: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            ProviderError::unexpected(format!("Failed to parse operation: {}", e))
        })?;
        let operation: Operation = serde_json::from_value(raw.clone()).map_err(|e| {
            ProviderError::unexpected(format!("Failed to parse operation: {}", e))
        })?;
        Ok((operation, raw))
    }
}

fn extract_progress(metadata: &serde_json::Value) -> Option<u8> {
    PROGRESS_KEYS
        .iter()
        .find_map(|key| metadata.get(key).and_then(value_as_percent))
}

fn value_as_percent(value: &serde_json::Value) -> Option<u8> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    Some(number.clamp(0.0, 100.0).round() as u8)
}

fn first_sample_uri(operation: &Operation) -> Option<&str> {
    operation
        .response
        .as_ref()
        .and_then(|r| r.generate_video_response.as_ref())
        .and_then(|g| g.generated_samples.first())
        .and_then(|s| s.video.as_ref())
        .and_then(|v| v.uri.as_deref())
}

#[async_trait]
impl ProviderAdapter for VeoClient {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn submit(&self, request: &GenerationRequest) -> ProviderResult<Submission> {
        let image = request.reference_image.as_ref().map(|reference| InlineImage {
            bytes_base64_encoded: reference.data.clone(),
            mime_type: reference.mime_type.clone(),
        });

        let body = PredictRequest {
            instances: vec![Instance {
                prompt: request.effective_prompt().to_string(),
                image,
            }],
            parameters: Parameters {
                aspect_ratio: request.aspect_ratio.clone(),
                negative_prompt: request.negative_prompt.clone(),
            },
        };

        let response = self
            .client
            .post(self.predict_url(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("Network error: {}", e)))?;

        let body = Self::read_success(response).await?;
        let operation: Operation = serde_json::from_str(&body)
            .map_err(|e| ProviderError::unexpected(format!("Failed to parse response: {}", e)))?;

        debug!("Veo operation started: {}", operation.name);

        let status = if operation.done {
            JobStatus::Completed
        } else {
            JobStatus::Queued
        };
        Ok(Submission {
            provider_ref: operation.name,
            video_id: None,
            status,
            progress: None,
        })
    }

    async fn poll(&self, provider_ref: &str) -> ProviderResult<PollOutcome> {
        let (operation, raw) = self.fetch_operation(provider_ref).await?;

        debug!("Veo poll for {}: done={}", provider_ref, operation.done);

        if !operation.done {
            let progress = operation.metadata.as_ref().and_then(extract_progress);
            return Ok(PollOutcome::Pending {
                status: JobStatus::InProgress,
                progress,
            });
        }

        if let Some(error) = operation.error {
            let message = error
                .message
                .unwrap_or_else(|| "Video generation failed".to_string());
            let rendered = match error.code {
                Some(code) => format!("{} (code: {})", message, code),
                None => message,
            };
            return Ok(PollOutcome::Failed {
                error: JobError::new(JobErrorCode::ProviderRejected, rendered),
            });
        }

        if first_sample_uri(&operation).is_some() {
            return Ok(PollOutcome::Succeeded {
                video_id: None,
                raw,
            });
        }

        let generated = operation
            .response
            .and_then(|r| r.generate_video_response);
        if let Some(generated) = generated.filter(|g| g.rai_media_filtered_count > 0) {
            let reasons = generated.rai_media_filtered_reasons.join("; ");
            let message = if reasons.is_empty() {
                format!("Generated video was removed by safety filters. {}", RAI_FILTER_GUIDANCE)
            } else {
                format!("{} {}", reasons, RAI_FILTER_GUIDANCE)
            };
            return Ok(PollOutcome::Failed {
                error: JobError::new(JobErrorCode::ContentFiltered, message),
            });
        }

        Ok(PollOutcome::Failed {
            error: JobError::new(
                JobErrorCode::ProviderRejected,
                "Operation completed without a video sample",
            ),
        })
    }

    async fn download_video(&self, provider_ref: &str) -> ProviderResult<MediaPayload> {
        let (operation, _) = self.fetch_operation(provider_ref).await?;
        let uri = first_sample_uri(&operation)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::unexpected("Operation has no video sample to download"))?;

        // The file endpoint requires the same API key as the operation calls.
        let response = self
            .client
            .get(&uri)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::download(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::download(format!(
                "Video download failed with status {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::download(format!("Failed to read content: {}", e)))?;
        Ok(MediaPayload::mp4(bytes.to_vec()))
    }

    async fn download_thumbnail(
        &self,
        _provider_ref: &str,
    ) -> ProviderResult<Option<MediaPayload>> {
        // Veo does not render a separate thumbnail asset.
        Ok(None)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const OPERATION_NAME: &str = "models/veo-3.0-generate-001/operations/op123";

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "a red fox in the snow".to_string(),
            model: "veo-3.0-generate-001".to_string(),
            ..Default::default()
        }
    }

    async fn client(server: &MockServer) -> VeoClient {
        VeoClient::new("test-key")
            .unwrap()
            .with_base_url(server.uri())
    }

    #[test]
    fn test_is_configured() {
        assert!(VeoClient::new("key").unwrap().is_configured());
        assert!(!VeoClient::new("").unwrap().is_configured());
    }

    #[test]
    fn test_value_as_percent() {
        assert_eq!(value_as_percent(&json!(55)), Some(55));
        assert_eq!(value_as_percent(&json!(72.4)), Some(72));
        assert_eq!(value_as_percent(&json!("88")), Some(88));
        assert_eq!(value_as_percent(&json!(250)), Some(100));
        assert_eq!(value_as_percent(&json!(-3)), Some(0));
        assert_eq!(value_as_percent(&json!(true)), None);
    }

    #[test]
    fn test_extract_progress_alternate_keys() {
        assert_eq!(extract_progress(&json!({ "progressPercent": 10 })), Some(10));
        assert_eq!(
            extract_progress(&json!({ "progressPercentage": "40" })),
            Some(40)
        );
        assert_eq!(extract_progress(&json!({ "percentComplete": 90.2 })), Some(90));
        assert_eq!(extract_progress(&json!({ "state": "running" })), None);
    }

    #[tokio::test]
    async fn test_submit_starts_operation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/veo-3.0-generate-001:predictLongRunning"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_json(json!({
                "instances": [{ "prompt": "a red fox in the snow" }],
                "parameters": {}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": OPERATION_NAME
            })))
            .expect(1)
            .mount(&server)
            .await;

        let submission = client(&server).await.submit(&request()).await.unwrap();
        assert_eq!(submission.provider_ref, OPERATION_NAME);
        assert_eq!(submission.video_id, None);
        assert_eq!(submission.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_submit_forwards_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/veo-3.0-generate-001:predictLongRunning"))
            .and(body_json(json!({
                "instances": [{ "prompt": "a red fox in the snow" }],
                "parameters": { "aspectRatio": "9:16", "negativePrompt": "blurry" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": OPERATION_NAME
            })))
            .expect(1)
            .mount(&server)
            .await;

        let req = GenerationRequest {
            aspect_ratio: Some("9:16".to_string()),
            negative_prompt: Some("blurry".to_string()),
            ..request()
        };
        client(&server).await.submit(&req).await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/veo-3.0-generate-001:predictLongRunning"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "Invalid prompt",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.submit(&request()).await.unwrap_err();
        match err {
            ProviderError::Rejected(msg) => {
                assert!(msg.contains("Invalid prompt"));
                assert!(msg.contains("INVALID_ARGUMENT"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_pending_extracts_progress() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{}", OPERATION_NAME)))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": OPERATION_NAME,
                "done": false,
                "metadata": { "progressPercent": 55 }
            })))
            .mount(&server)
            .await;

        match client(&server).await.poll(OPERATION_NAME).await.unwrap() {
            PollOutcome::Pending { status, progress } => {
                assert_eq!(status, JobStatus::InProgress);
                assert_eq!(progress, Some(55));
            }
            other => panic!("expected Pending, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_done_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{}", OPERATION_NAME)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": OPERATION_NAME,
                "done": true,
                "response": {
                    "generateVideoResponse": {
                        "generatedSamples": [
                            { "video": { "uri": "https://example.com/files/abc:download" } }
                        ]
                    }
                }
            })))
            .mount(&server)
            .await;

        match client(&server).await.poll(OPERATION_NAME).await.unwrap() {
            PollOutcome::Succeeded { video_id, raw } => {
                assert_eq!(video_id, None);
                assert_eq!(raw["done"], true);
            }
            other => panic!("expected Succeeded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_done_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{}", OPERATION_NAME)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": OPERATION_NAME,
                "done": true,
                "error": { "code": 13, "message": "Internal render failure" }
            })))
            .mount(&server)
            .await;

        match client(&server).await.poll(OPERATION_NAME).await.unwrap() {
            PollOutcome::Failed { error } => {
                assert_eq!(error.code, JobErrorCode::ProviderRejected);
                assert!(error.message.contains("Internal render failure"));
                assert!(error.message.contains("13"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_rai_filtered() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{}", OPERATION_NAME)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": OPERATION_NAME,
                "done": true,
                "response": {
                    "generateVideoResponse": {
                        "raiMediaFilteredCount": 1,
                        "raiMediaFilteredReasons": ["Prompt depicts a real person"],
                        "generatedSamples": []
                    }
                }
            })))
            .mount(&server)
            .await;

        match client(&server).await.poll(OPERATION_NAME).await.unwrap() {
            PollOutcome::Failed { error } => {
                assert_eq!(error.code, JobErrorCode::ContentFiltered);
                assert!(error.message.contains("Prompt depicts a real person"));
                assert!(error.message.contains("responsible AI"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_done_without_sample() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{}", OPERATION_NAME)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": OPERATION_NAME,
                "done": true,
                "response": { "generateVideoResponse": { "generatedSamples": [] } }
            })))
            .mount(&server)
            .await;

        match client(&server).await.poll(OPERATION_NAME).await.unwrap() {
            PollOutcome::Failed { error } => {
                assert_eq!(error.code, JobErrorCode::ProviderRejected);
                assert!(error.message.contains("without a video sample"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_video_follows_sample_uri() {
        let server = MockServer::start().await;
        let uri = format!("{}/download/files/video.mp4", server.uri());
        Mock::given(method("GET"))
            .and(path(format!("/{}", OPERATION_NAME)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": OPERATION_NAME,
                "done": true,
                "response": {
                    "generateVideoResponse": {
                        "generatedSamples": [{ "video": { "uri": uri } }]
                    }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/download/files/video.mp4"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"veo bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let payload = client(&server)
            .await
            .download_video(OPERATION_NAME)
            .await
            .unwrap();
        assert_eq!(payload.bytes, b"veo bytes");
        assert_eq!(payload.extension, "mp4");
    }

    #[tokio::test]
    async fn test_download_thumbnail_is_none() {
        let server = MockServer::start().await;
        let payload = client(&server)
            .await
            .download_thumbnail(OPERATION_NAME)
            .await
            .unwrap();
        assert!(payload.is_none());
    }
}
