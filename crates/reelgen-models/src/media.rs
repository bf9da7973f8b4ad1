//! Raw media passed between provider downloads and storage.

/// Bytes of one downloaded asset plus enough typing to store it.
#[derive(Debug, Clone)]
pub struct MediaPayload {
    /// Raw bytes
    pub bytes: Vec<u8>,
    /// File extension without the dot, e.g. `mp4`
    pub extension: String,
    /// MIME type, e.g. `video/mp4`
    pub content_type: String,
}

impl MediaPayload {
    pub fn new(
        bytes: Vec<u8>,
        extension: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            extension: extension.into(),
            content_type: content_type.into(),
        }
    }

    pub fn mp4(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "mp4", "video/mp4")
    }

    pub fn webp(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "webp", "image/webp")
    }
}
