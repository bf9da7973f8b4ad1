//! Tenant identity attached to every request.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Organization/user pair resolved by the gateway upstream of this service.
///
/// Captured once at job submission; ownership checks compare against these
/// values and never against anything derived from job content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TenantContext {
    /// Organization ID
    pub organization_id: String,

    /// User ID within the organization
    pub user_id: String,

    /// User email, when the gateway forwards it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl TenantContext {
    pub fn new(organization_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            user_id: user_id.into(),
            user_email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }
}
