use anyhow::{Context, Result};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::{fs, task};
use tracing::{info, warn};

/// URL prefix under which the media root is served.
pub const MEDIA_URL_PREFIX: &str = "/media";

const RECIPE_UPLOAD_DIR: &str = "uploads/recipe";

/// Raster formats accepted for recipe images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    Bmp,
}

impl ImageFormat {
    /// Guesses the format from the contents and decodes the whole image.
    /// Returns `None` for unsupported formats and for payloads that fail to
    /// decode, such as a valid header followed by garbage.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        let reader = ::image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .ok()?;

        let format = match reader.format()? {
            ::image::ImageFormat::Jpeg => Self::Jpeg,
            ::image::ImageFormat::Png => Self::Png,
            ::image::ImageFormat::Gif => Self::Gif,
            ::image::ImageFormat::WebP => Self::WebP,
            ::image::ImageFormat::Bmp => Self::Bmp,
            _ => return None,
        };

        reader.decode().ok().map(|_| format)
    }

    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
        }
    }
}

/// Stores uploaded recipe images below the media root.
pub struct ImageService {
    media_root: PathBuf,
}

impl ImageService {
    #[must_use]
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    #[must_use]
    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// Decodes the upload off the async runtime.
    pub async fn inspect(&self, bytes: Vec<u8>) -> Result<Option<ImageFormat>> {
        task::spawn_blocking(move || ImageFormat::detect(&bytes))
            .await
            .context("Image decoding task panicked")
    }

    /// Writes the image under a fresh unique name and returns its path
    /// relative to the media root, e.g. `uploads/recipe/<uuid>.png`.
    pub async fn save_recipe_image(&self, bytes: &[u8], format: ImageFormat) -> Result<String> {
        let dir = self.media_root.join(RECIPE_UPLOAD_DIR);
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let filename = format!("{}.{}", uuid::Uuid::new_v4(), format.extension());
        let file_path = dir.join(&filename);

        fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

        info!(path = %file_path.display(), size = bytes.len(), "Stored recipe image");

        Ok(format!("{RECIPE_UPLOAD_DIR}/{filename}"))
    }

    /// Removes a previously stored file. Failures are logged, not returned.
    pub async fn remove(&self, relative_path: &str) {
        let Some(path) = self.resolve(relative_path) else {
            warn!(path = relative_path, "Refusing to remove image outside media root");
            return;
        };

        match fs::remove_file(&path).await {
            Ok(()) => info!(path = %path.display(), "Removed recipe image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove recipe image"),
        }
    }

    fn resolve(&self, relative_path: &str) -> Option<PathBuf> {
        let relative = Path::new(relative_path);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
        is_plain.then(|| self.media_root.join(relative))
    }
}

/// Public URL of a stored media path.
#[must_use]
pub fn public_url(relative_path: &str) -> String {
    format!("{MEDIA_URL_PREFIX}/{}", relative_path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(format: ::image::ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        ::image::RgbImage::new(2, 2).write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn detects_decodable_images() {
        assert_eq!(
            ImageFormat::detect(&encoded(::image::ImageFormat::Png)),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::detect(&encoded(::image::ImageFormat::Jpeg)),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::detect(&encoded(::image::ImageFormat::Bmp)),
            Some(ImageFormat::Bmp)
        );
    }

    #[test]
    fn rejects_non_images() {
        assert_eq!(ImageFormat::detect(b"notanimage"), None);
        assert_eq!(ImageFormat::detect(b""), None);
        assert_eq!(ImageFormat::detect(b"BM"), None);
    }

    #[test]
    fn rejects_valid_header_with_garbage_body() {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF];
        jpeg.extend_from_slice(b"this is plain text, not a jpeg");
        assert_eq!(ImageFormat::detect(&jpeg), None);

        let mut png = encoded(::image::ImageFormat::Png);
        png.truncate(24);
        assert_eq!(ImageFormat::detect(&png), None);

        let mut bmp = b"BM".to_vec();
        bmp.extend_from_slice(&[0u8; 40]);
        assert_eq!(ImageFormat::detect(&bmp), None);
    }

    #[test]
    fn public_url_is_under_media() {
        assert_eq!(public_url("uploads/recipe/a.png"), "/media/uploads/recipe/a.png");
    }

    #[tokio::test]
    async fn inspect_runs_detection() {
        let service = ImageService::new(std::env::temp_dir());
        let png = encoded(::image::ImageFormat::Png);

        assert_eq!(service.inspect(png).await.unwrap(), Some(ImageFormat::Png));
        assert_eq!(service.inspect(b"GIF89a....".to_vec()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_and_remove_round_trip() {
        let root = std::env::temp_dir().join(format!("pantry-media-{}", uuid::Uuid::new_v4()));
        let service = ImageService::new(&root);

        let relative = service
            .save_recipe_image(&encoded(::image::ImageFormat::Png), ImageFormat::Png)
            .await
            .unwrap();
        assert!(relative.starts_with("uploads/recipe/"));
        assert!(relative.ends_with(".png"));
        assert!(root.join(&relative).exists());

        service.remove(&relative).await;
        assert!(!root.join(&relative).exists());

        // Traversal outside the media root is ignored.
        service.remove("../outside.png").await;

        let _ = std::fs::remove_dir_all(root);
    }
}
