//! Blob storage backend abstraction.

use async_trait::async_trait;

use crate::error::StorageResult;

/// Information about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modified timestamp (milliseconds since epoch)
    pub last_modified: Option<u64>,
}

/// Pluggable blob storage backend.
///
/// Implementations must return every object under a prefix from `list`,
/// with last-modified times comparable across objects; the archive
/// indexer depends on both.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload bytes under a key.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Download a whole object.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// List all objects under a prefix.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Verify the backend is reachable.
    async fn check_connectivity(&self) -> StorageResult<()>;
}
