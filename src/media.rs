//! Turning a local image file into a string a blog post can embed.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use std::path::Path;
use thiserror::Error;

/// Largest image accepted for embedding.
pub const MAX_IMAGE_SIZE: u64 = 2 * 1024 * 1024; // 2MB

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a supported image type: {0}")]
    UnsupportedType(String),
    #[error("Image too large ({size} bytes, limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}

/// Produces the embeddable reference stored in `BlogPost::image`.
#[async_trait]
pub trait ImageEncoder: Send + Sync {
    async fn encode(&self, path: &Path) -> Result<String, MediaError>;
}

/// Encodes images as `data:<mime>;base64,...` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlEncoder;

fn image_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => return None,
    };
    Some(mime)
}

#[async_trait]
impl ImageEncoder for DataUrlEncoder {
    async fn encode(&self, path: &Path) -> Result<String, MediaError> {
        let mime = image_mime_type(path)
            .ok_or_else(|| MediaError::UnsupportedType(path.display().to_string()))?;

        let size = tokio::fs::metadata(path).await?.len();
        if size > MAX_IMAGE_SIZE {
            return Err(MediaError::TooLarge {
                size,
                limit: MAX_IMAGE_SIZE,
            });
        }

        let bytes = tokio::fs::read(path).await?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), mime, "Image encoded");
        Ok(format!("data:{mime};base64,{}", BASE64_STANDARD.encode(&bytes)))
    }
}
