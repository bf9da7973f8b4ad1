//! Job orchestration for ReelGen.
//!
//! This crate provides:
//! - `JobOrchestrator`: submission, status lookup and recent-job listing
//! - `JobStore`: the live job registry, with an in-memory default
//! - Per-job drive tasks that poll providers, persist finished assets
//!   and garbage-collect expired registry entries
//!
//! Jobs move through exactly one lifecycle: `queued` or `in_progress` at
//! submission, then a single transition to `completed` or `failed`. The
//! registry holds live and recently finished jobs only; durable history
//! comes from the storage archive.

pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod registry;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::JobOrchestrator;
pub use registry::{InMemoryJobStore, JobStore};
