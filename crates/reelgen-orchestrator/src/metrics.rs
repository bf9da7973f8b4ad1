//! Job lifecycle metrics.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Jobs accepted by a provider, by provider.
    pub const JOBS_SUBMITTED_TOTAL: &str = "reelgen_jobs_submitted_total";

    /// Jobs that reached `completed`, by provider.
    pub const JOBS_COMPLETED_TOTAL: &str = "reelgen_jobs_completed_total";

    /// Jobs that reached `failed`, by provider and error code.
    pub const JOBS_FAILED_TOTAL: &str = "reelgen_jobs_failed_total";
}

/// Record a job accepted by its provider.
pub fn record_job_submitted(provider: &str) {
    counter!(
        names::JOBS_SUBMITTED_TOTAL,
        "provider" => provider.to_string()
    )
    .increment(1);
}

/// Record a job completing.
pub fn record_job_completed(provider: &str) {
    counter!(
        names::JOBS_COMPLETED_TOTAL,
        "provider" => provider.to_string()
    )
    .increment(1);
}

/// Record a job failing.
pub fn record_job_failed(provider: &str, code: &str) {
    counter!(
        names::JOBS_FAILED_TOTAL,
        "provider" => provider.to_string(),
        "code" => code.to_string()
    )
    .increment(1);
}
