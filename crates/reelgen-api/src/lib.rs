//! Axum HTTP API server.
//!
//! This crate provides:
//! - The REST surface for submitting and polling generation jobs
//! - Tenant identity extraction from trusted gateway headers
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
