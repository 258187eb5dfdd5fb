//! Uploaded media storage
//!
//! Post images live under `<media root>/posts_images/` with a random UUID file
//! name. The database stores the path relative to the media root, which is
//! also the path they are served under below `/media/`.

use crate::config::MediaConfig;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Subdirectory of the media root holding post images
pub const POST_IMAGES_DIR: &str = "posts_images";

/// Error types for media storage
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,

    #[error("Image type {0} is not allowed.")]
    TypeNotAllowed(String),

    #[error("The image is too large. Maximum size is {max_mb} MB.")]
    TooLarge { max_mb: u64 },

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Whether the error is the uploader's fault rather than the server's
    pub fn is_invalid_upload(&self) -> bool {
        !matches!(self, MediaError::Io(_))
    }
}

/// Filesystem-backed media storage
#[derive(Debug, Clone)]
pub struct MediaStorage {
    config: MediaConfig,
}

impl MediaStorage {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Check an upload without storing it, returning its detected MIME type
    pub fn validate_image(&self, data: &[u8]) -> Result<&'static str, MediaError> {
        if data.len() as u64 > self.config.max_file_size {
            return Err(MediaError::TooLarge {
                max_mb: (self.config.max_file_size / 1024 / 1024).max(1),
            });
        }
        let mime = detect_image_type(data).ok_or(MediaError::NotAnImage)?;
        if !self.config.is_type_allowed(mime) {
            return Err(MediaError::TypeNotAllowed(mime.to_string()));
        }
        Ok(mime)
    }

    /// Store a post image and return its path relative to the media root
    pub async fn save_post_image(&self, declared_type: &str, data: &[u8]) -> Result<String, MediaError> {
        let mime = self.validate_image(data)?;
        if declared_type != mime {
            tracing::debug!(declared_type, detected = mime, "Upload content type mismatch");
        }

        let dir = self.config.path.join(POST_IMAGES_DIR);
        fs::create_dir_all(&dir).await?;

        let filename = format!("{}.{}", Uuid::new_v4(), self.config.get_extension(mime));
        fs::write(dir.join(&filename), data).await?;

        Ok(format!("{}/{}", POST_IMAGES_DIR, filename))
    }

    /// Delete a stored file. Failures are logged, never returned.
    pub async fn remove(&self, relative: &str) {
        let Some(path) = self.resolve(relative) else {
            tracing::warn!(path = relative, "Refusing to delete media outside the media root");
            return;
        };
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), "Failed to delete media file: {}", e);
            }
        }
    }

    /// Absolute path of a stored file, rejecting anything that escapes the root
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let safe = relative
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
        if !safe || relative.as_os_str().is_empty() {
            return None;
        }
        Some(self.config.path.join(relative))
    }
}

/// Identify an image by its leading bytes
pub fn detect_image_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else if data.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn storage(dir: &Path) -> MediaStorage {
        MediaStorage::new(MediaConfig {
            path: dir.to_path_buf(),
            ..MediaConfig::default()
        })
    }

    #[test]
    fn test_detect_image_type() {
        assert_eq!(detect_image_type(PNG), Some("image/png"));
        assert_eq!(detect_image_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(detect_image_type(b"GIF89a..."), Some("image/gif"));
        assert_eq!(detect_image_type(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(detect_image_type(b"hello world"), None);
        assert_eq!(detect_image_type(b""), None);
    }

    #[tokio::test]
    async fn test_save_and_remove_post_image() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());

        let relative = storage.save_post_image("image/png", PNG).await.unwrap();
        assert!(relative.starts_with("posts_images/"));
        assert!(relative.ends_with(".png"));

        let path = storage.resolve(&relative).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), PNG);

        storage.remove(&relative).await;
        assert!(!path.exists());

        // Removing twice is harmless
        storage.remove(&relative).await;
    }

    #[tokio::test]
    async fn test_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let err = storage(dir.path())
            .save_post_image("image/png", b"not really a png")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::NotAnImage));
        assert!(err.is_invalid_upload());
    }

    #[tokio::test]
    async fn test_rejects_large_and_disallowed_images() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(MediaConfig {
            path: dir.path().to_path_buf(),
            max_file_size: 8,
            allowed_types: vec!["image/jpeg".to_string()],
        });

        assert!(matches!(
            storage.validate_image(PNG),
            Err(MediaError::TooLarge { .. })
        ));
        assert!(matches!(
            storage.validate_image(b"GIF89a"),
            Err(MediaError::TypeNotAllowed(_))
        ));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let storage = storage(Path::new("media"));
        assert!(storage.resolve("../etc/passwd").is_none());
        assert!(storage.resolve("/etc/passwd").is_none());
        assert!(storage.resolve("").is_none());
        assert_eq!(
            storage.resolve("posts_images/a.png"),
            Some(PathBuf::from("media/posts_images/a.png"))
        );
    }
}
