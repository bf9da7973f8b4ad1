//! Blob storage for generated video assets.
//!
//! This crate provides:
//! - A backend trait with S3-compatible and local-filesystem implementations
//! - Deterministic object naming shared by writers and the archive parser
//! - Asset persistence for completed generations (video, thumbnail,
//!   reference images, metadata sidecar)
//! - Archive reconstruction from object listings, with pagination

pub mod archive;
pub mod assets;
pub mod backend;
pub mod config;
pub mod error;
pub mod local;
pub mod naming;
pub mod s3;

pub use archive::{ArchiveIndexer, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use assets::{AssetStore, GenerationAssets, VideoMetadata};
pub use backend::{BlobStore, ObjectInfo};
pub use config::{StorageBackendKind, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use local::LocalBlobStore;
pub use s3::{S3BlobStore, S3Config};
