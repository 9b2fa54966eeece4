use std::path::Path;

use image::ImageFormat;
use mime::Mime;
use tokio::fs;
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;

/// Avatars are shrunk to fit inside this square, aspect ratio preserved.
pub const AVATAR_MAX_DIMENSION: u32 = 300;

pub fn is_allowed_avatar_type(mime: &Mime) -> bool {
    mime.type_() == mime::IMAGE && matches!(mime.subtype().as_str(), "jpeg" | "png" | "webp")
}

/// Content type of an uploaded part: the declared header when present,
/// otherwise guessed from the filename extension.
pub fn resolve_content_type(declared: Option<&str>, filename: Option<&str>) -> Option<Mime> {
    if let Some(declared) = declared {
        return declared.parse().ok();
    }
    filename.and_then(|name| mime_guess::from_path(name).first())
}

/// Decodes the uploaded image, resizes it to fit 300x300 and stores it as
/// PNG under the upload dir. Returns the stored path.
pub async fn store_avatar(config: &Config, user_id: Uuid, data: &[u8]) -> Result<String> {
    let img = image::load_from_memory(data)?;
    // Never upscale: small avatars are stored as-is.
    let resized = if img.width() > AVATAR_MAX_DIMENSION || img.height() > AVATAR_MAX_DIMENSION {
        img.thumbnail(AVATAR_MAX_DIMENSION, AVATAR_MAX_DIMENSION)
    } else {
        img
    };

    let avatar_dir = Path::new(&config.upload_dir).join("avatars");
    fs::create_dir_all(&avatar_dir).await?;

    let filename = format!("{}.png", user_id);
    let path = avatar_dir.join(&filename);
    resized.save_with_format(&path, ImageFormat::Png)?;

    Ok(path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::io::Cursor;

    fn test_config(upload_dir: &str) -> Config {
        Config {
            database_url: String::new(),
            redis_url: String::new(),
            jwt_secret: String::new(),
            jwt_expiry_hours: 24,
            port: 0,
            host: String::new(),
            upload_dir: upload_dir.to_string(),
            max_file_size: 10 * 1024 * 1024,
            allowed_origins: Vec::new(),
            posts_page_size: 5,
            profile_posts_page_size: 2,
            comments_page_size: 5,
            replies_display_limit: 3,
            category_cache_ttl_secs: 3600,
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::new(width, height);
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn image_types_are_allowed() {
        assert!(is_allowed_avatar_type(&mime::IMAGE_JPEG));
        assert!(is_allowed_avatar_type(&mime::IMAGE_PNG));
        assert!(!is_allowed_avatar_type(&mime::TEXT_PLAIN));
        assert!(!is_allowed_avatar_type(&mime::IMAGE_GIF));
    }

    #[test]
    fn content_type_falls_back_to_filename() {
        let declared = resolve_content_type(Some("image/png"), None).unwrap();
        assert_eq!(declared, mime::IMAGE_PNG);

        let guessed = resolve_content_type(None, Some("photo.jpg")).unwrap();
        assert_eq!(guessed, mime::IMAGE_JPEG);

        assert!(resolve_content_type(None, None).is_none());
    }

    #[tokio::test]
    async fn oversized_avatar_is_shrunk_to_fit() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().to_str().unwrap());
        let user_id = Uuid::new_v4();

        let path = store_avatar(&config, user_id, &png_bytes(600, 400))
            .await
            .unwrap();

        let stored = image::open(&path).unwrap();
        assert!(stored.width() <= AVATAR_MAX_DIMENSION);
        assert!(stored.height() <= AVATAR_MAX_DIMENSION);
    }

    #[tokio::test]
    async fn small_avatar_keeps_its_size() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().to_str().unwrap());

        let path = store_avatar(&config, Uuid::new_v4(), &png_bytes(120, 80))
            .await
            .unwrap();

        let stored = image::open(&path).unwrap();
        assert_eq!((stored.width(), stored.height()), (120, 80));
    }

    #[tokio::test]
    async fn garbage_bytes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path().to_str().unwrap());

        let result = store_avatar(&config, Uuid::new_v4(), b"not an image").await;
        assert!(result.is_err());
    }
}
