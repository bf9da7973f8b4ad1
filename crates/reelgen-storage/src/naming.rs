//! Deterministic object naming for generated assets.
//!
//! Every asset of one generation shares a session id and encodes its own
//! identity in the object name:
//!
//! ```text
//! {session}_{provider}_{model_slug}.mp4                  primary video
//! {session}_{provider}_{model_slug}_thumbnail.webp       thumbnail
//! {session}_{provider}_{model_slug}_metadata.json        metadata sidecar
//! {session}_{provider}_{model_slug}_reference_original.png
//! {session}_{provider}_{model_slug}_reference_cropped.png
//! ```
//!
//! where `session` is `{epoch_millis}_{8 hex chars}`. The archive is
//! reconstructed purely by parsing these names back, so generation and
//! parsing live together in this module and must stay in sync.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

use reelgen_models::Provider;

static VIDEO_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+_[0-9a-f]{8})_([a-z0-9]+)_([a-z0-9-]+)\.(mp4|webm)$").unwrap()
});

static THUMBNAIL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+_[0-9a-f]{8})_([a-z0-9]+)_([a-z0-9-]+)_thumbnail\.(webp|png|jpg)$").unwrap()
});

static METADATA_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+_[0-9a-f]{8})_([a-z0-9]+)_([a-z0-9-]+)_metadata\.json$").unwrap()
});

/// Generate a session identifier: epoch millis plus 8 random hex chars.
pub fn new_session_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}_{}", Utc::now().timestamp_millis(), &uuid[..8])
}

/// Lowercase a model identifier and map every non-alphanumeric character
/// to a dash. Slugs never contain `_`; the name parser depends on that.
pub fn model_slug(model: &str) -> String {
    model
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Key prefix all of a tenant's assets live under.
pub fn tenant_prefix(root: &str, organization_id: &str, user_id: &str) -> String {
    format!("{}/{}/{}/", root, organization_id, user_id)
}

fn stem(session_id: &str, provider: Provider, model: &str) -> String {
    format!("{}_{}_{}", session_id, provider.as_str(), model_slug(model))
}

/// Name of the primary video object.
pub fn video_object_name(
    session_id: &str,
    provider: Provider,
    model: &str,
    extension: &str,
) -> String {
    format!("{}.{}", stem(session_id, provider, model), extension)
}

/// Name of the thumbnail object.
pub fn thumbnail_object_name(
    session_id: &str,
    provider: Provider,
    model: &str,
    extension: &str,
) -> String {
    format!("{}_thumbnail.{}", stem(session_id, provider, model), extension)
}

/// Name of the metadata sidecar.
pub fn metadata_object_name(session_id: &str, provider: Provider, model: &str) -> String {
    format!("{}_metadata.json", stem(session_id, provider, model))
}

/// Which copy of the reference image an object holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Pre-crop upload
    Original,
    /// The copy actually sent to the provider
    Cropped,
}

/// Name of a reference-image sidecar.
pub fn reference_object_name(
    session_id: &str,
    provider: Provider,
    model: &str,
    kind: ReferenceKind,
    extension: &str,
) -> String {
    let suffix = match kind {
        ReferenceKind::Original => "reference_original",
        ReferenceKind::Cropped => "reference_cropped",
    };
    format!("{}_{}.{}", stem(session_id, provider, model), suffix, extension)
}

/// Identity shared by every asset of one generation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
    pub session_id: String,
    pub provider: Provider,
    pub model_slug: String,
}

/// What a stored object name says about itself.
///
/// Reference-image sidecars and foreign objects parse to `None`; the
/// archive never surfaces them directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedObjectName {
    Video(SessionDescriptor),
    Thumbnail(SessionDescriptor),
    Metadata(SessionDescriptor),
}

impl ParsedObjectName {
    pub fn descriptor(&self) -> &SessionDescriptor {
        match self {
            ParsedObjectName::Video(d)
            | ParsedObjectName::Thumbnail(d)
            | ParsedObjectName::Metadata(d) => d,
        }
    }
}

/// Parse a bare object name (no key prefix) back into its descriptor.
pub fn parse_object_name(name: &str) -> Option<ParsedObjectName> {
    if let Some(caps) = VIDEO_NAME.captures(name) {
        return descriptor_from(&caps).map(ParsedObjectName::Video);
    }
    if let Some(caps) = THUMBNAIL_NAME.captures(name) {
        return descriptor_from(&caps).map(ParsedObjectName::Thumbnail);
    }
    if let Some(caps) = METADATA_NAME.captures(name) {
        return descriptor_from(&caps).map(ParsedObjectName::Metadata);
    }
    None
}

fn descriptor_from(caps: &regex::Captures<'_>) -> Option<SessionDescriptor> {
    let provider = Provider::parse(caps.get(2)?.as_str())?;
    Some(SessionDescriptor {
        session_id: caps.get(1)?.as_str().to_string(),
        provider,
        model_slug: caps.get(3)?.as_str().to_string(),
    })
}

/// Epoch millis embedded in a session id, used when the backend reports
/// no last-modified time.
pub fn session_epoch_millis(session_id: &str) -> Option<u64> {
    session_id.split('_').next()?.parse().ok()
}

/// Content type for a stored object name, by extension.
pub fn content_type_for_name(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("webp") => "image/webp",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// File extension for an image MIME type. Unknown types store as png.
pub fn extension_for_image_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_shape() {
        let id = new_session_id();
        assert!(session_epoch_millis(&id).is_some());
        let hex = id.split('_').nth(1).unwrap();
        assert_eq!(hex.len(), 8);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_model_slug() {
        assert_eq!(model_slug("sora-2"), "sora-2");
        assert_eq!(model_slug("Sora-2-Pro"), "sora-2-pro");
        assert_eq!(model_slug("veo-3.0-generate-001"), "veo-3-0-generate-001");
        assert_eq!(model_slug("my model_v2"), "my-model-v2");
    }

    #[test]
    fn test_video_name_round_trip() {
        let name = video_object_name("1700000000000_deadbeef", Provider::OpenAi, "sora-2", "mp4");
        assert_eq!(name, "1700000000000_deadbeef_openai_sora-2.mp4");

        let parsed = parse_object_name(&name).unwrap();
        match parsed {
            ParsedObjectName::Video(d) => {
                assert_eq!(d.session_id, "1700000000000_deadbeef");
                assert_eq!(d.provider, Provider::OpenAi);
                assert_eq!(d.model_slug, "sora-2");
            }
            other => panic!("expected video, got {:?}", other),
        }
    }

    #[test]
    fn test_thumbnail_name_round_trip() {
        let name = thumbnail_object_name(
            "1700000000000_deadbeef",
            Provider::Google,
            "veo-3.0-generate-001",
            "webp",
        );
        assert_eq!(
            name,
            "1700000000000_deadbeef_google_veo-3-0-generate-001_thumbnail.webp"
        );

        match parse_object_name(&name).unwrap() {
            ParsedObjectName::Thumbnail(d) => {
                assert_eq!(d.provider, Provider::Google);
                assert_eq!(d.model_slug, "veo-3-0-generate-001");
            }
            other => panic!("expected thumbnail, got {:?}", other),
        }
    }

    #[test]
    fn test_metadata_name_round_trip() {
        let name = metadata_object_name("1700000000000_deadbeef", Provider::OpenAi, "sora-2-pro");
        assert_eq!(name, "1700000000000_deadbeef_openai_sora-2-pro_metadata.json");

        assert!(matches!(
            parse_object_name(&name),
            Some(ParsedObjectName::Metadata(_))
        ));
    }

    #[test]
    fn test_reference_names_are_not_archive_entries() {
        for kind in [ReferenceKind::Original, ReferenceKind::Cropped] {
            let name = reference_object_name(
                "1700000000000_deadbeef",
                Provider::OpenAi,
                "sora-2",
                kind,
                "png",
            );
            assert_eq!(parse_object_name(&name), None);
        }
    }

    #[test]
    fn test_foreign_names_are_skipped() {
        assert_eq!(parse_object_name("notes.txt"), None);
        assert_eq!(parse_object_name("upload.mp4"), None);
        assert_eq!(parse_object_name(""), None);
        // Unknown provider token
        assert_eq!(
            parse_object_name("1700000000000_deadbeef_stability_sdxl.mp4"),
            None
        );
        // Session id with wrong hex width
        assert_eq!(
            parse_object_name("1700000000000_dead_openai_sora-2.mp4"),
            None
        );
    }

    #[test]
    fn test_tenant_prefix() {
        assert_eq!(
            tenant_prefix("generated-videos", "org-1", "user-1"),
            "generated-videos/org-1/user-1/"
        );
    }

    #[test]
    fn test_content_type_for_name() {
        assert_eq!(content_type_for_name("a.mp4"), "video/mp4");
        assert_eq!(content_type_for_name("a_thumbnail.webp"), "image/webp");
        assert_eq!(content_type_for_name("a_metadata.json"), "application/json");
        assert_eq!(content_type_for_name("a.bin"), "application/octet-stream");
    }

    #[test]
    fn test_session_epoch_millis() {
        assert_eq!(
            session_epoch_millis("1700000000000_deadbeef"),
            Some(1700000000000)
        );
        assert_eq!(session_epoch_millis("junk"), None);
    }

    #[test]
    fn test_extension_for_image_mime() {
        assert_eq!(extension_for_image_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_image_mime("image/webp"), "webp");
        assert_eq!(extension_for_image_mime("image/png"), "png");
        assert_eq!(extension_for_image_mime("application/pdf"), "png");
    }
}
