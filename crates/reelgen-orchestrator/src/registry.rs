//! Live job registry.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use reelgen_models::{JobId, TenantContext, VideoJob};

/// Keyed job storage behind the orchestrator.
///
/// Each job's mutable fields are written only by its own drive task; the
/// store itself must tolerate concurrent reads, inserts and deletes.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, id: &JobId) -> Option<VideoJob>;
    async fn put(&self, job: VideoJob);
    async fn delete(&self, id: &JobId) -> bool;
    async fn list_by_owner(&self, tenant: &TenantContext) -> Vec<VideoJob>;
}

/// In-memory registry. Job state is volatile by design; after a restart
/// the archive reconstructs completed sessions from blob storage.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, VideoJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registry entries, for diagnostics.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn get(&self, id: &JobId) -> Option<VideoJob> {
        self.jobs.read().await.get(id).cloned()
    }

    async fn put(&self, job: VideoJob) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    async fn delete(&self, id: &JobId) -> bool {
        self.jobs.write().await.remove(id).is_some()
    }

    async fn list_by_owner(&self, tenant: &TenantContext) -> Vec<VideoJob> {
        self.jobs
            .read()
            .await
            .values()
            .filter(|job| job.owned_by(tenant))
            .cloned()
            .collect()
    }
}
