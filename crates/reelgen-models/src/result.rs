//! Stored results and archive listings.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Provider;

/// Where a completed job's assets ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoredVideoResult {
    /// Session identifier shared by every asset of this generation
    pub session_id: String,

    /// Job this result belongs to
    pub job_id: String,

    /// Provider-assigned video id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,

    /// Source video id, for remixes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remix_of: Option<String>,

    /// Retrieval URL of the stored video
    pub video_url: String,

    /// Retrieval URL of the thumbnail, when one was stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Retrieval URL of the metadata sidecar
    pub metadata_url: String,

    /// Primary video object name
    pub file_name: String,

    /// When the assets were persisted
    pub created_at: DateTime<Utc>,
}

/// One generation session reconstructed from stored object names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArchivedVideoEntry {
    /// Session identifier parsed from the object name
    pub session_id: String,

    /// Provider parsed from the object name
    pub provider: Provider,

    /// Model slug as embedded in the object name
    pub model: String,

    /// Retrieval URL of the stored video
    pub video_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_url: Option<String>,

    /// Primary video object name
    pub file_name: String,

    /// Blob last-modified time of the primary video
    pub timestamp: DateTime<Utc>,

    /// Recovered from the metadata sidecar when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// Pagination block returned with archive pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Pagination {
    /// 1-based page number
    pub page: u32,

    /// Page size
    pub limit: u32,

    /// Total entries across all pages
    pub total: u64,

    /// Total number of pages
    pub total_pages: u32,

    /// Whether a later page exists
    pub has_more: bool,
}

impl Pagination {
    /// Build the block for a 1-based page window over `total` entries.
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            ((total - 1) / limit.max(1) as u64 + 1) as u32
        };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_more: (page as u64) * (limit as u64) < total,
        }
    }
}
