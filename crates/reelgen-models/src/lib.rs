//! Shared data models for the ReelGen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Generation requests and tenant identity
//! - Job lifecycle and failure taxonomy
//! - Stored results and archive listings
//! - Provider/model routing

pub mod job;
pub mod media;
pub mod provider;
pub mod request;
pub mod result;
pub mod tenant;

// Re-export common types
pub use job::{JobError, JobErrorCode, JobId, JobStatus, VideoJob};
pub use media::MediaPayload;
pub use provider::{Provider, SUPPORTED_MODELS};
pub use request::{GenerationRequest, ReferenceImage};
pub use result::{ArchivedVideoEntry, Pagination, StoredVideoResult};
pub use tenant::TenantContext;
