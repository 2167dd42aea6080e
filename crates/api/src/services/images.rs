//! Recipe image storage.
//!
//! Images arrive inline as `data:image/<ext>;base64,<payload>` URIs and are
//! written under `<media_root>/recipes/`. The database stores the path
//! relative to the media root; URLs are derived from it at read time.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use uuid::Uuid;

/// Accepted image extensions.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpeg", "jpg", "gif", "webp"];

/// Subdirectory of the media root holding recipe images.
const RECIPE_DIR: &str = "recipes";

/// Errors that can occur while storing an image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Not a `data:image/<ext>;base64,` URI.
    #[error("expected a data:image/<ext>;base64 URI")]
    InvalidDataUri,

    /// Extension outside [`ALLOWED_EXTENSIONS`].
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Payload decodes to nothing.
    #[error("image is empty")]
    Empty,

    /// Writing the file failed.
    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// A decoded data URI.
#[derive(Debug, PartialEq, Eq)]
struct DecodedImage {
    extension: String,
    bytes: Vec<u8>,
}

fn decode_data_uri(uri: &str) -> Result<DecodedImage, ImageError> {
    let rest = uri
        .trim()
        .strip_prefix("data:image/")
        .ok_or(ImageError::InvalidDataUri)?;
    let (extension, payload) = rest.split_once(";base64,").ok_or(ImageError::InvalidDataUri)?;

    let extension = extension.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ImageError::UnsupportedFormat(extension));
    }

    let bytes = STANDARD.decode(payload.trim())?;
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }

    Ok(DecodedImage { extension, bytes })
}

/// Filesystem-backed image store.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    url_prefix: String,
}

impl ImageStore {
    /// Create a store writing under `root` and serving under `url_prefix`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    /// Media root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decode a data URI and write it to a fresh file.
    ///
    /// Returns the stored path relative to the media root.
    ///
    /// # Errors
    ///
    /// Returns an `ImageError` for a malformed URI, an unsupported format or
    /// an I/O failure.
    pub async fn save_data_uri(&self, uri: &str) -> Result<String, ImageError> {
        let image = decode_data_uri(uri)?;
        let relative = format!("{RECIPE_DIR}/{}.{}", Uuid::new_v4(), image.extension);

        tokio::fs::create_dir_all(self.root.join(RECIPE_DIR)).await?;
        tokio::fs::write(self.root.join(&relative), &image.bytes).await?;

        tracing::debug!(path = %relative, size = image.bytes.len(), "Stored recipe image");
        Ok(relative)
    }

    /// Public URL of a stored image.
    #[must_use]
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}/{relative}", self.url_prefix)
    }

    /// Remove a stored image. Failures are logged, not returned.
    pub async fn remove(&self, relative: &str) {
        if let Err(e) = tokio::fs::remove_file(self.root.join(relative)).await {
            tracing::warn!(path = %relative, error = %e, "Failed to remove recipe image");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // 1x1 transparent GIF
    const GIF: &str = "R0lGODlhAQABAAAAACH5BAEKAAEALAAAAAABAAEAAAICTAEAOw==";

    #[test]
    fn test_decode_valid_uri() {
        let image = decode_data_uri(&format!("data:image/gif;base64,{GIF}")).unwrap();
        assert_eq!(image.extension, "gif");
        assert!(image.bytes.starts_with(b"GIF89a"));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let image = decode_data_uri(&format!("data:image/PNG;base64,{GIF}")).unwrap();
        assert_eq!(image.extension, "png");
    }

    #[test]
    fn test_rejects_bad_uris() {
        assert!(matches!(
            decode_data_uri("https://example.com/a.png"),
            Err(ImageError::InvalidDataUri)
        ));
        assert!(matches!(
            decode_data_uri("data:image/png,plain"),
            Err(ImageError::InvalidDataUri)
        ));
        assert!(matches!(
            decode_data_uri(&format!("data:image/svg+xml;base64,{GIF}")),
            Err(ImageError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            decode_data_uri("data:image/png;base64,!!!"),
            Err(ImageError::Decode(_))
        ));
        assert!(matches!(
            decode_data_uri("data:image/png;base64,"),
            Err(ImageError::Empty)
        ));
    }

    #[test]
    fn test_url_for() {
        let store = ImageStore::new("media", "/media");
        assert_eq!(store.url_for("recipes/a.png"), "/media/recipes/a.png");
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let root = std::env::temp_dir().join(format!("foodgram-images-{}", Uuid::new_v4()));
        let store = ImageStore::new(&root, "/media");

        let relative = store
            .save_data_uri(&format!("data:image/gif;base64,{GIF}"))
            .await
            .unwrap();
        assert!(relative.starts_with("recipes/"));
        assert!(relative.ends_with(".gif"));
        assert!(root.join(&relative).exists());

        store.remove(&relative).await;
        assert!(!root.join(&relative).exists());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
