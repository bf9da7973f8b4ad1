//! Storage configuration.

use std::sync::Arc;

use crate::backend::BlobStore;
use crate::error::{StorageError, StorageResult};
use crate::local::LocalBlobStore;
use crate::s3::S3BlobStore;

/// Which blob backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    S3,
    Local,
}

/// Storage settings shared by the asset store and archive indexer.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Selected backend
    pub backend: StorageBackendKind,
    /// Key prefix all generated assets live under
    pub root_prefix: String,
    /// Public base URL retrieval links are built against
    pub public_base_url: String,
    /// Filesystem root for the local backend
    pub local_root: String,
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .as_str()
        {
            "s3" => StorageBackendKind::S3,
            "local" => StorageBackendKind::Local,
            other => {
                return Err(StorageError::config_error(format!(
                    "unknown STORAGE_BACKEND: {}",
                    other
                )))
            }
        };

        Ok(Self {
            backend,
            root_prefix: std::env::var("STORAGE_ROOT_PREFIX")
                .unwrap_or_else(|_| "generated-videos".to_string()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string())
                .trim_end_matches('/')
                .to_string(),
            local_root: std::env::var("LOCAL_STORAGE_ROOT")
                .unwrap_or_else(|_| "./data/storage".to_string()),
        })
    }

    /// Construct the configured backend.
    pub fn build_backend(&self) -> StorageResult<Arc<dyn BlobStore>> {
        match self.backend {
            StorageBackendKind::S3 => Ok(Arc::new(S3BlobStore::from_env()?)),
            StorageBackendKind::Local => Ok(Arc::new(LocalBlobStore::new(&self.local_root))),
        }
    }
}
