//! Generation providers and model routing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream video-generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI video jobs API (Sora models)
    OpenAi,
    /// Google Generative Language API (Veo models)
    Google,
}

/// Model identifiers and the provider that serves them.
pub const SUPPORTED_MODELS: &[(&str, Provider)] = &[
    ("sora-2", Provider::OpenAi),
    ("sora-2-pro", Provider::OpenAi),
    ("veo-3.0-generate-001", Provider::Google),
    ("veo-3.0-fast-generate-001", Provider::Google),
    ("veo-2.0-generate-001", Provider::Google),
];

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Google => "google",
        }
    }

    /// Parse the lowercase token used in object names.
    pub fn parse(value: &str) -> Option<Provider> {
        match value {
            "openai" => Some(Provider::OpenAi),
            "google" => Some(Provider::Google),
            _ => None,
        }
    }

    /// Route a model identifier to the provider that serves it.
    pub fn for_model(model: &str) -> Option<Provider> {
        SUPPORTED_MODELS
            .iter()
            .find(|(name, _)| *name == model)
            .map(|(_, provider)| *provider)
    }

    /// Model identifiers this provider accepts.
    pub fn models(&self) -> Vec<&'static str> {
        SUPPORTED_MODELS
            .iter()
            .filter(|(_, provider)| provider == self)
            .map(|(name, _)| *name)
            .collect()
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
