//! Video generation provider adapters for ReelGen.
//!
//! This crate provides:
//! - A uniform [`ProviderAdapter`] trait covering submit, poll and download
//! - [`SoraClient`] for OpenAI's `/v1/videos` polling-job API
//! - [`VeoClient`] for Google's Veo long-running operation API
//! - Provider error types shared by the orchestrator
//!
//! Adapters normalize wire-level statuses into [`reelgen_models::JobStatus`]
//! and map provider failures onto the job error taxonomy. They never retry
//! or re-submit on their own; pacing belongs to the orchestrator.

pub mod adapter;
pub mod error;
pub mod google;
pub mod openai;

pub use adapter::{PollOutcome, ProviderAdapter, Submission};
pub use error::{ProviderError, ProviderResult};
pub use google::VeoClient;
pub use openai::SoraClient;
