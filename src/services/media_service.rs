use std::io;
use std::path::PathBuf;
use uuid::Uuid;

/// Sub-directory of the media root that holds recipe images.
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,
    #[error("The submitted file is empty.")]
    Empty,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Detects the format from the file's magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }
}

/// Files stored under the configured media root. Paths handed out are
/// relative to the root so they can be turned into URLs.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes a recipe image under a fresh uuid name and returns its relative path.
    pub async fn save_recipe_image(&self, bytes: &[u8]) -> Result<String, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        let format = ImageFormat::sniff(bytes).ok_or(MediaError::NotAnImage)?;

        let relative = format!(
            "{}/{}.{}",
            RECIPE_IMAGE_DIR,
            Uuid::new_v4(),
            format.extension()
        );
        let full_path = self.root.join(&relative);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;

        tracing::debug!("Stored recipe image at {}", full_path.display());
        Ok(relative)
    }

    /// Removes a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> Result<(), MediaError> {
        let full_path = self.root.join(relative.trim_start_matches('/'));
        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_sniff_formats() {
        assert_eq!(ImageFormat::sniff(PNG_HEADER), Some(ImageFormat::Png));
        assert_eq!(
            ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::sniff(b"GIF89a..."), Some(ImageFormat::Gif));
        assert_eq!(
            ImageFormat::sniff(b"RIFF\0\0\0\0WEBPVP8 "),
            Some(ImageFormat::Webp)
        );
        assert_eq!(ImageFormat::sniff(b"not an image"), None);
    }

    #[tokio::test]
    async fn test_save_and_remove_image() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());

        let path = storage.save_recipe_image(PNG_HEADER).await.unwrap();
        assert!(path.starts_with("uploads/recipe/"));
        assert!(path.ends_with(".png"));
        assert!(dir.path().join(&path).exists());

        storage.remove(&path).await.unwrap();
        assert!(!dir.path().join(&path).exists());

        // Removing twice is fine
        storage.remove(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());

        let result = storage.save_recipe_image(b"plain text").await;
        assert!(matches!(result, Err(MediaError::NotAnImage)));

        let result = storage.save_recipe_image(b"").await;
        assert!(matches!(result, Err(MediaError::Empty)));
    }
}
