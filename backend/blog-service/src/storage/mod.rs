//! Storage for post images.
//!
//! Images are written under a media root as `posts/<uuid>.<ext>` and posts
//! reference them by that relative path.

use async_trait::async_trait;
use mime::Mime;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Directory under the media root that holds post images.
pub const POST_IMAGE_DIR: &str = "posts";

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist an uploaded image and return its reference.
    async fn save(&self, content_type: &Mime, bytes: &[u8]) -> Result<String>;
}

/// Writes images to the local filesystem.
pub struct LocalImageStore {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, content_type: &Mime, bytes: &[u8]) -> Result<String> {
        let extension = validate_image(content_type, bytes, self.max_bytes)?;

        let dir = self.root.join(POST_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        let reference = format!("{}/{}", POST_IMAGE_DIR, file_name);
        info!(image = %reference, size = bytes.len(), "Image stored");
        Ok(reference)
    }
}

/// File extension for an accepted image type. Anything that is not a
/// supported image, is empty, or is larger than `max_bytes` is rejected on
/// the `image` field.
pub fn validate_image(content_type: &Mime, bytes: &[u8], max_bytes: usize) -> Result<&'static str> {
    if content_type.type_() != mime::IMAGE {
        return Err(AppError::validation(
            "image",
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        ));
    }

    let extension = match content_type.subtype().as_str() {
        "jpeg" | "jpg" => "jpg",
        "png" => "png",
        "gif" => "gif",
        "webp" => "webp",
        other => {
            return Err(AppError::validation(
                "image",
                format!("Unsupported image type: {}", other),
            ))
        }
    };

    if bytes.is_empty() {
        return Err(AppError::validation("image", "The submitted file is empty."));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::validation(
            "image",
            format!("Image exceeds the {} byte limit.", max_bytes),
        ));
    }

    Ok(extension)
}
