//! Asset persistence for completed generations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use reelgen_models::{MediaPayload, Provider, StoredVideoResult, TenantContext, VideoJob};

use crate::backend::BlobStore;
use crate::error::StorageResult;
use crate::naming::{self, ReferenceKind};

/// Everything downloaded for one completed generation, ready to persist.
#[derive(Debug, Clone)]
pub struct GenerationAssets {
    /// The generated video
    pub video: MediaPayload,
    /// Provider thumbnail, when one exists
    pub thumbnail: Option<MediaPayload>,
    /// Pre-crop reference image upload
    pub reference_original: Option<MediaPayload>,
    /// Reference image as sent to the provider
    pub reference_cropped: Option<MediaPayload>,
    /// Provider-assigned video id
    pub provider_video_id: Option<String>,
    /// Raw provider response, kept for debugging
    pub provider_response: Option<serde_json::Value>,
}

impl GenerationAssets {
    pub fn new(video: MediaPayload) -> Self {
        Self {
            video,
            thumbnail: None,
            reference_original: None,
            reference_cropped: None,
            provider_video_id: None,
            provider_response: None,
        }
    }
}

/// Metadata sidecar stored next to every generated video.
///
/// Self-sufficient: an archive entry can be rebuilt from this document
/// alone, without the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub session_id: String,
    pub job_id: String,
    pub provider: Provider,
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remix_of: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    pub file_name: String,
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_original_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_cropped_url: Option<String>,
    pub organization_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_response: Option<serde_json::Value>,
}

/// Persists generation assets under deterministic names.
#[derive(Clone)]
pub struct AssetStore {
    store: Arc<dyn BlobStore>,
    root_prefix: String,
    public_base_url: String,
}

impl AssetStore {
    pub fn new(
        store: Arc<dyn BlobStore>,
        root_prefix: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            root_prefix: root_prefix.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn file_url(&self, file_name: &str) -> String {
        format!("{}/api/files/{}", self.public_base_url, file_name)
    }

    /// Persist every asset of a completed generation.
    ///
    /// The video and the metadata sidecar must land; reference images and
    /// the thumbnail are best-effort. The sidecar is written last so its
    /// presence marks a fully persisted session. Not transactional: a
    /// crash mid-way leaves a video the archive still surfaces by name.
    pub async fn persist(
        &self,
        tenant: &TenantContext,
        job: &VideoJob,
        assets: GenerationAssets,
    ) -> StorageResult<StoredVideoResult> {
        let session_id = naming::new_session_id();
        let prefix =
            naming::tenant_prefix(&self.root_prefix, &tenant.organization_id, &tenant.user_id);
        let created_at = Utc::now();

        let video_name = naming::video_object_name(
            &session_id,
            job.provider,
            &job.model,
            &assets.video.extension,
        );
        self.store
            .put(
                &format!("{}{}", prefix, video_name),
                assets.video.bytes,
                &assets.video.content_type,
            )
            .await?;
        let video_url = self.file_url(&video_name);

        let reference_original_url = self
            .put_reference(
                &prefix,
                &session_id,
                job,
                ReferenceKind::Original,
                assets.reference_original,
            )
            .await;
        let reference_cropped_url = self
            .put_reference(
                &prefix,
                &session_id,
                job,
                ReferenceKind::Cropped,
                assets.reference_cropped,
            )
            .await;

        let mut thumbnail_url = None;
        if let Some(thumb) = assets.thumbnail {
            let name = naming::thumbnail_object_name(
                &session_id,
                job.provider,
                &job.model,
                &thumb.extension,
            );
            match self
                .store
                .put(&format!("{}{}", prefix, name), thumb.bytes, &thumb.content_type)
                .await
            {
                Ok(()) => thumbnail_url = Some(self.file_url(&name)),
                Err(e) => warn!("Thumbnail upload failed for {}: {}", job.id, e),
            }
        }

        let metadata_name = naming::metadata_object_name(&session_id, job.provider, &job.model);
        let metadata_url = self.file_url(&metadata_name);
        let metadata = VideoMetadata {
            session_id: session_id.clone(),
            job_id: job.id.to_string(),
            provider: job.provider,
            model: job.model.clone(),
            prompt: job.prompt.clone(),
            size: job.size.clone(),
            seconds: job.seconds,
            aspect_ratio: job.aspect_ratio.clone(),
            negative_prompt: job.negative_prompt.clone(),
            remix_of: job.remix_of.clone(),
            video_id: assets.provider_video_id.clone(),
            file_name: video_name.clone(),
            video_url: video_url.clone(),
            thumbnail_url: thumbnail_url.clone(),
            reference_original_url,
            reference_cropped_url,
            organization_id: tenant.organization_id.clone(),
            user_id: tenant.user_id.clone(),
            created_at,
            provider_response: assets.provider_response,
        };
        self.store
            .put(
                &format!("{}{}", prefix, metadata_name),
                serde_json::to_vec_pretty(&metadata)?,
                "application/json",
            )
            .await?;

        info!("Persisted session {} for job {}", session_id, job.id);

        Ok(StoredVideoResult {
            session_id,
            job_id: job.id.to_string(),
            video_id: assets.provider_video_id,
            remix_of: job.remix_of.clone(),
            video_url,
            thumbnail_url,
            metadata_url,
            file_name: video_name,
            created_at,
        })
    }

    async fn put_reference(
        &self,
        prefix: &str,
        session_id: &str,
        job: &VideoJob,
        kind: ReferenceKind,
        payload: Option<MediaPayload>,
    ) -> Option<String> {
        let payload = payload?;
        let name = naming::reference_object_name(
            session_id,
            job.provider,
            &job.model,
            kind,
            &payload.extension,
        );
        match self
            .store
            .put(&format!("{}{}", prefix, name), payload.bytes, &payload.content_type)
            .await
        {
            Ok(()) => Some(self.file_url(&name)),
            Err(e) => {
                warn!("Reference image upload failed for {}: {}", job.id, e);
                None
            }
        }
    }
}
