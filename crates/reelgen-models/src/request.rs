//! Generation request bodies.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Reference image supplied with a generation request.
///
/// `data` carries the (possibly cropped) image actually sent to the
/// provider; `original_data` preserves the pre-crop upload so both copies
/// can be stored next to the generated video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceImage {
    /// Base64-encoded image bytes (no data-URL prefix)
    pub data: String,

    /// MIME type, e.g. `image/png`
    pub mime_type: String,

    /// Pre-crop original, if the caller cropped before submitting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_data: Option<String>,

    /// MIME type of the original
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_mime_type: Option<String>,
}

/// Request body for starting a generation job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, JsonSchema)]
pub struct GenerationRequest {
    /// Text prompt (ignored for remix requests)
    #[serde(default)]
    #[validate(length(max = 10000, message = "Prompt too long"))]
    pub prompt: String,

    /// Model identifier, routed to a provider
    #[validate(length(min = 1, max = 128, message = "Model is required"))]
    pub model: String,

    /// Output resolution, e.g. `1280x720`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Clip length in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 60, message = "Seconds out of range"))]
    pub seconds: Option<u32>,

    /// Aspect ratio, e.g. `16:9`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    /// Negative prompt (Veo models)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    /// Provider video id to remix from (Sora models)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remix_of: Option<String>,

    /// Prompt for the remix
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 10000, message = "Remix prompt too long"))]
    pub remix_prompt: Option<String>,

    /// Reference image to condition on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<ReferenceImage>,
}

impl GenerationRequest {
    pub fn is_remix(&self) -> bool {
        self.remix_of.is_some()
    }

    /// The prompt that actually drives generation: remix requests take it
    /// from `remix_prompt`, everything else from `prompt`.
    pub fn effective_prompt(&self) -> &str {
        if self.is_remix() {
            self.remix_prompt.as_deref().unwrap_or("")
        } else {
            &self.prompt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> GenerationRequest {
        GenerationRequest {
            prompt: "a red fox in the snow".to_string(),
            model: "sora-2".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_effective_prompt_plain() {
        let req = base_request();
        assert!(!req.is_remix());
        assert_eq!(req.effective_prompt(), "a red fox in the snow");
    }

    #[test]
    fn test_effective_prompt_remix() {
        let req = GenerationRequest {
            remix_of: Some("video_abc".to_string()),
            remix_prompt: Some("make it night time".to_string()),
            ..base_request()
        };
        assert!(req.is_remix());
        assert_eq!(req.effective_prompt(), "make it night time");
    }

    #[test]
    fn test_remix_without_prompt_is_empty() {
        let req = GenerationRequest {
            remix_of: Some("video_abc".to_string()),
            ..base_request()
        };
        assert_eq!(req.effective_prompt(), "");
    }

    #[test]
    fn test_validation_rejects_missing_model() {
        use validator::Validate;

        let req = GenerationRequest {
            model: String::new(),
            ..base_request()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_excessive_seconds() {
        use validator::Validate;

        let req = GenerationRequest {
            seconds: Some(600),
            ..base_request()
        };
        assert!(req.validate().is_err());
    }
}
