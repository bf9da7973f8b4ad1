//! Archive reconstruction from stored object names.
//!
//! No database backs the archive: every listing walks the tenant's key
//! prefix and rebuilds sessions from the names alone. Sessions survive
//! process restarts and registry garbage collection because of this.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use reelgen_models::{ArchivedVideoEntry, Pagination, TenantContext};

use crate::backend::BlobStore;
use crate::error::StorageResult;
use crate::naming::{self, ParsedObjectName, SessionDescriptor};

/// Default archive page size.
pub const DEFAULT_PAGE_LIMIT: u32 = 12;

/// Upper bound on archive page size.
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug)]
struct SessionAccumulator {
    descriptor: SessionDescriptor,
    video_name: Option<String>,
    video_last_modified: Option<u64>,
    thumbnail_name: Option<String>,
    metadata_name: Option<String>,
}

impl SessionAccumulator {
    fn new(descriptor: SessionDescriptor) -> Self {
        Self {
            descriptor,
            video_name: None,
            video_last_modified: None,
            thumbnail_name: None,
            metadata_name: None,
        }
    }
}

/// Reconstructs a tenant's generation history from blob listings.
#[derive(Clone)]
pub struct ArchiveIndexer {
    store: Arc<dyn BlobStore>,
    root_prefix: String,
    public_base_url: String,
}

impl ArchiveIndexer {
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

    /// List a page of the tenant's archive, newest first.
    ///
    /// `page` is 1-based; `limit` is clamped to `1..=MAX_PAGE_LIMIT`.
    /// Sessions without a video object (orphaned sidecars) are dropped.
    pub async fn list(
        &self,
        tenant: &TenantContext,
        page: u32,
        limit: u32,
    ) -> StorageResult<(Vec<ArchivedVideoEntry>, Pagination)> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);

        let prefix =
            naming::tenant_prefix(&self.root_prefix, &tenant.organization_id, &tenant.user_id);
        let objects = self.store.list(&prefix).await?;

        let mut sessions: HashMap<String, SessionAccumulator> = HashMap::new();
        for obj in &objects {
            let name = obj.key.rsplit('/').next().unwrap_or(obj.key.as_str());
            let Some(parsed) = naming::parse_object_name(name) else {
                continue;
            };

            let descriptor = parsed.descriptor().clone();
            let acc = sessions
                .entry(descriptor.session_id.clone())
                .or_insert_with(|| SessionAccumulator::new(descriptor));

            match parsed {
                ParsedObjectName::Video(_) => {
                    acc.video_name = Some(name.to_string());
                    acc.video_last_modified = obj.last_modified;
                }
                ParsedObjectName::Thumbnail(_) => acc.thumbnail_name = Some(name.to_string()),
                ParsedObjectName::Metadata(_) => acc.metadata_name = Some(name.to_string()),
            }
        }

        let mut entries: Vec<(ArchivedVideoEntry, Option<String>)> = sessions
            .into_values()
            .filter_map(|acc| {
                let video_name = acc.video_name?;
                let timestamp = resolve_timestamp(&acc.descriptor.session_id, acc.video_last_modified);
                let entry = ArchivedVideoEntry {
                    session_id: acc.descriptor.session_id,
                    provider: acc.descriptor.provider,
                    model: acc.descriptor.model_slug,
                    video_url: self.file_url(&video_name),
                    thumbnail_url: acc.thumbnail_name.as_deref().map(|n| self.file_url(n)),
                    metadata_url: acc.metadata_name.as_deref().map(|n| self.file_url(n)),
                    file_name: video_name,
                    timestamp,
                    job_id: None,
                };
                Some((entry, acc.metadata_name))
            })
            .collect();

        // Newest first; session id breaks last-modified ties so pages
        // stay stable across calls.
        entries.sort_by(|a, b| {
            b.0.timestamp
                .cmp(&a.0.timestamp)
                .then_with(|| b.0.session_id.cmp(&a.0.session_id))
        });

        let total = entries.len() as u64;
        let start = ((page - 1) as usize).saturating_mul(limit as usize);
        let mut page_entries: Vec<(ArchivedVideoEntry, Option<String>)> =
            entries.into_iter().skip(start).take(limit as usize).collect();

        // Recover job ids from metadata sidecars, best effort.
        for (entry, metadata_name) in &mut page_entries {
            let Some(name) = metadata_name else { continue };
            let key = format!("{}{}", prefix, name);
            match self.store.get(&key).await {
                Ok(bytes) => {
                    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) {
                        entry.job_id = value
                            .get("job_id")
                            .and_then(|v| v.as_str())
                            .map(String::from);
                    }
                }
                Err(e) => debug!("Metadata fetch failed for {}: {}", key, e),
            }
        }

        let entries = page_entries.into_iter().map(|(entry, _)| entry).collect();
        Ok((entries, Pagination::new(page, limit, total)))
    }
}

fn resolve_timestamp(session_id: &str, last_modified: Option<u64>) -> DateTime<Utc> {
    last_modified
        .or_else(|| naming::session_epoch_millis(session_id))
        .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
        .unwrap_or_else(Utc::now)
}
