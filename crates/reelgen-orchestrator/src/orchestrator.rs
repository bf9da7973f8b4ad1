//! Job orchestration.
//!
//! Owns the live registry, routes requests to provider adapters by model,
//! and drives every submitted job to a terminal state from a detached task.

use std::collections::HashMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use validator::Validate;

use reelgen_models::{
    GenerationRequest, JobError, JobErrorCode, JobId, JobStatus, MediaPayload, Provider,
    ReferenceImage, TenantContext, VideoJob,
};
use reelgen_providers::{PollOutcome, ProviderAdapter};
use reelgen_storage::naming::extension_for_image_mime;
use reelgen_storage::{AssetStore, GenerationAssets};

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::metrics;
use crate::registry::JobStore;

/// Routes generation requests to provider adapters and tracks the
/// resulting jobs until they are garbage collected.
#[derive(Clone)]
pub struct JobOrchestrator {
    config: OrchestratorConfig,
    store: Arc<dyn JobStore>,
    adapters: Arc<HashMap<Provider, Arc<dyn ProviderAdapter>>>,
    assets: Arc<AssetStore>,
    gc_timers: Arc<Mutex<HashMap<JobId, JoinHandle<()>>>>,
}

impl JobOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        store: Arc<dyn JobStore>,
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        assets: Arc<AssetStore>,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.provider(), adapter))
            .collect();

        Self {
            config,
            store,
            adapters: Arc::new(adapters),
            assets,
            gc_timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Validate, register and launch a generation job.
    ///
    /// Returns as soon as the provider has accepted the job; the returned
    /// job is `Queued` or `InProgress`, never terminal. Everything after
    /// registration surfaces through the job's own fields.
    pub async fn submit(
        &self,
        tenant: &TenantContext,
        request: &GenerationRequest,
    ) -> OrchestratorResult<VideoJob> {
        request
            .validate()
            .map_err(|e| OrchestratorError::invalid_request(e.to_string()))?;

        let provider = Provider::for_model(&request.model)
            .ok_or_else(|| OrchestratorError::unsupported_model(&request.model))?;

        if request.effective_prompt().trim().is_empty() {
            return Err(OrchestratorError::invalid_request(
                "A prompt is required (remix requests use the remix prompt)",
            ));
        }

        if request.remix_of.is_some() && provider != Provider::OpenAi {
            return Err(OrchestratorError::invalid_request(format!(
                "Model {} does not support remixing",
                request.model
            )));
        }

        if let Some(reference) = &request.reference_image {
            if BASE64.decode(reference.data.as_bytes()).is_err() {
                return Err(OrchestratorError::invalid_request(
                    "Reference image is not valid base64",
                ));
            }
            if let Some(original) = &reference.original_data {
                if BASE64.decode(original.as_bytes()).is_err() {
                    return Err(OrchestratorError::invalid_request(
                        "Original reference image is not valid base64",
                    ));
                }
            }
        }

        let adapter = self.adapter_for(provider)?;
        if !adapter.is_configured() {
            return Err(OrchestratorError::provider_not_configured(format!(
                "No credential configured for {}",
                provider
            )));
        }

        // The creation call runs inside submit; a provider-side rejection
        // is surfaced synchronously and no job is registered.
        let submission = adapter.submit(request).await?;

        let mut job = VideoJob::new(provider, tenant, request)
            .with_provider_ref(submission.provider_ref);
        // A creation response claiming a terminal state still has to go
        // through the poll/download path; clamp it to in_progress.
        if submission.status != JobStatus::Queued {
            job = job.begin(submission.progress);
        }

        info!("Submitted job {} (model {})", job.id, job.model);
        metrics::record_job_submitted(provider.as_str());

        self.store.put(job.clone()).await;
        self.spawn_drive(job.clone(), adapter, request.reference_image.clone());

        Ok(job)
    }

    /// Fetch a job, enforcing the ownership captured at submission.
    pub async fn get_status(
        &self,
        tenant: &TenantContext,
        id: &JobId,
    ) -> OrchestratorResult<VideoJob> {
        let job = self
            .store
            .get(id)
            .await
            .ok_or_else(|| OrchestratorError::not_found(id.as_str()))?;

        if !job.owned_by(tenant) {
            return Err(OrchestratorError::Forbidden);
        }
        Ok(job)
    }

    /// Jobs owned by the caller submitted within the retention window,
    /// newest first. Registry-only; the archive covers prior lifetimes.
    pub async fn list_recent(&self, tenant: &TenantContext) -> Vec<VideoJob> {
        let cutoff = Utc::now() - chrono::Duration::seconds(self.config.retention.as_secs() as i64);
        let mut jobs: Vec<VideoJob> = self
            .store
            .list_by_owner(tenant)
            .await
            .into_iter()
            .filter(|job| job.created_at >= cutoff)
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    fn adapter_for(&self, provider: Provider) -> OrchestratorResult<Arc<dyn ProviderAdapter>> {
        self.adapters
            .get(&provider)
            .cloned()
            .ok_or_else(|| OrchestratorError::provider_not_configured(provider.as_str()))
    }

    fn spawn_drive(
        &self,
        job: VideoJob,
        adapter: Arc<dyn ProviderAdapter>,
        reference: Option<ReferenceImage>,
    ) {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.drive(job, adapter, reference).await;
        });
    }

    /// Poll the provider until terminal, then download and persist.
    ///
    /// Sole writer of the job's mutable fields. Every exit path ends in a
    /// terminal registry write; nothing escapes the task.
    async fn drive(
        &self,
        mut job: VideoJob,
        adapter: Arc<dyn ProviderAdapter>,
        reference: Option<ReferenceImage>,
    ) {
        let provider_ref = match job.provider_ref.clone() {
            Some(provider_ref) => provider_ref,
            None => {
                self.finish_failed(
                    job,
                    JobError::new(
                        JobErrorCode::ProviderRejected,
                        "Job has no provider reference to poll",
                    ),
                )
                .await;
                return;
            }
        };

        let mut outcome = None;
        for attempt in 1..=self.config.max_poll_attempts {
            tokio::time::sleep(self.config.poll_interval).await;

            match adapter.poll(&provider_ref).await {
                Ok(PollOutcome::Pending { status, progress }) => {
                    debug!(
                        "Job {} pending after attempt {}: {} progress={:?}",
                        job.id,
                        attempt,
                        status.as_str(),
                        progress
                    );
                    job = match status {
                        JobStatus::InProgress => job.begin(progress),
                        _ => match progress {
                            Some(p) => job.with_progress(p),
                            None => job,
                        },
                    };
                    self.store.put(job.clone()).await;
                }
                Ok(terminal) => {
                    outcome = Some(terminal);
                    break;
                }
                Err(e) => {
                    // Transient transport errors consume the attempt; the
                    // next scheduled poll is the retry.
                    warn!("Poll attempt {} for job {} failed: {}", attempt, job.id, e);
                }
            }
        }

        match outcome {
            Some(PollOutcome::Succeeded { video_id, raw }) => {
                self.settle_success(job, adapter, &provider_ref, video_id, raw, reference)
                    .await;
            }
            Some(PollOutcome::Failed { error }) => {
                info!("Job {} failed at the provider: {}", job.id, error);
                self.finish_failed(job, error).await;
            }
            _ => {
                let message = format!(
                    "No terminal status after {} poll attempts",
                    self.config.max_poll_attempts
                );
                self.finish_failed(job, JobError::new(JobErrorCode::PollTimeout, message))
                    .await;
            }
        }
    }

    /// Download the finished assets, persist them, complete the job.
    async fn settle_success(
        &self,
        job: VideoJob,
        adapter: Arc<dyn ProviderAdapter>,
        provider_ref: &str,
        video_id: Option<String>,
        raw: serde_json::Value,
        reference: Option<ReferenceImage>,
    ) {
        let video = match adapter.download_video(provider_ref).await {
            Ok(payload) => payload,
            Err(e) => {
                error!("Job {} video download failed: {}", job.id, e);
                self.finish_failed(
                    job,
                    JobError::new(JobErrorCode::DownloadFailed, e.to_string()),
                )
                .await;
                return;
            }
        };

        // Thumbnail loss never fails the job.
        let thumbnail = match adapter.download_thumbnail(provider_ref).await {
            Ok(thumbnail) => thumbnail,
            Err(e) => {
                warn!("Job {} thumbnail download failed: {}", job.id, e);
                None
            }
        };

        let mut assets = GenerationAssets::new(video);
        assets.thumbnail = thumbnail;
        assets.provider_video_id = video_id;
        assets.provider_response = Some(raw);
        if let Some(reference) = reference {
            let (original, cropped) = decode_reference(&reference);
            assets.reference_original = original;
            assets.reference_cropped = cropped;
        }

        let tenant = TenantContext {
            organization_id: job.organization_id.clone(),
            user_id: job.user_id.clone(),
            user_email: job.user_email.clone(),
        };

        match self.assets.persist(&tenant, &job, assets).await {
            Ok(result) => {
                metrics::record_job_completed(job.provider.as_str());
                let completed = job.complete(result);
                info!("Job {} completed", completed.id);
                let id = completed.id.clone();
                self.store.put(completed).await;
                self.schedule_gc(id).await;
            }
            Err(e) => {
                // Generation succeeded but nothing was stored; the job
                // must not report completed without a video URL.
                error!("Job {} persistence failed: {}", job.id, e);
                self.finish_failed(
                    job,
                    JobError::new(JobErrorCode::PersistenceError, e.to_string()),
                )
                .await;
            }
        }
    }

    async fn finish_failed(&self, job: VideoJob, error: JobError) {
        metrics::record_job_failed(job.provider.as_str(), error.code.as_str());
        let failed = job.fail(error);
        let id = failed.id.clone();
        self.store.put(failed).await;
        self.schedule_gc(id).await;
    }

    /// Remove the registry entry once the retention window elapses.
    /// Rescheduling for the same job aborts the previous timer.
    async fn schedule_gc(&self, id: JobId) {
        let store = Arc::clone(&self.store);
        let timers = Arc::clone(&self.gc_timers);
        let retention = self.config.retention;
        let timer_id = id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            if store.delete(&timer_id).await {
                debug!("Collected expired job {}", timer_id);
            }
            timers.lock().await.remove(&timer_id);
        });

        if let Some(previous) = self.gc_timers.lock().await.insert(id, handle) {
            previous.abort();
        }
    }
}

fn decode_reference(reference: &ReferenceImage) -> (Option<MediaPayload>, Option<MediaPayload>) {
    let cropped = decode_image(&reference.data, &reference.mime_type);
    let original = reference.original_data.as_ref().and_then(|data| {
        let mime = reference
            .original_mime_type
            .as_deref()
            .unwrap_or(&reference.mime_type);
        decode_image(data, mime)
    });
    (original, cropped)
}

fn decode_image(data: &str, mime: &str) -> Option<MediaPayload> {
    match BASE64.decode(data.as_bytes()) {
        Ok(bytes) => Some(MediaPayload::new(bytes, extension_for_image_mime(mime), mime)),
        Err(e) => {
            warn!("Reference image decode failed: {}", e);
            None
        }
    }
}
