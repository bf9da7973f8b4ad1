//! Application state.

use std::sync::Arc;

use tracing::{info, warn};

use reelgen_orchestrator::{InMemoryJobStore, JobOrchestrator, OrchestratorConfig};
use reelgen_providers::{ProviderAdapter, SoraClient, VeoClient};
use reelgen_storage::{ArchiveIndexer, AssetStore, BlobStore, StorageConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage_config: StorageConfig,
    pub storage: Arc<dyn BlobStore>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub archive: Arc<ArchiveIndexer>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let storage_config = StorageConfig::from_env()?;
        let storage = storage_config.build_backend()?;
        info!(
            "Storage backend: {:?} (prefix {})",
            storage_config.backend, storage_config.root_prefix
        );

        let assets = Arc::new(AssetStore::new(
            Arc::clone(&storage),
            storage_config.root_prefix.clone(),
            storage_config.public_base_url.clone(),
        ));
        let archive = Arc::new(ArchiveIndexer::new(
            Arc::clone(&storage),
            storage_config.root_prefix.clone(),
            storage_config.public_base_url.clone(),
        ));

        // Both adapters are always registered; submissions for a provider
        // without a credential fail with a config error instead of a panic.
        let sora = SoraClient::from_env()?;
        if !sora.is_configured() {
            warn!("OPENAI_API_KEY not set; Sora submissions will be rejected");
        }
        let veo = VeoClient::from_env()?;
        if !veo.is_configured() {
            warn!("GEMINI_API_KEY not set; Veo submissions will be rejected");
        }
        let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![Arc::new(sora), Arc::new(veo)];

        let orchestrator = Arc::new(JobOrchestrator::new(
            OrchestratorConfig::from_env(),
            Arc::new(InMemoryJobStore::new()),
            adapters,
            assets,
        ));

        Ok(Self {
            config,
            storage_config,
            storage,
            orchestrator,
            archive,
        })
    }
}
