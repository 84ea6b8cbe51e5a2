//! # Image thumbnails
//!
//! Uploaded photos are downscaled and re-encoded as JPEG data URLs before
//! they are attached to a listing.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use cm_core::error::{AppError, Result};
use cm_core::models::MAX_IMAGES;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ImageReader;
use std::io::Cursor;

/// Longest side of a stored thumbnail, in pixels.
pub const MAX_DIMENSION: u32 = 1080;
pub const JPEG_QUALITY: u8 = 80;

/// Target size for a `width` x `height` image, keeping the aspect ratio.
pub fn thumbnail_size(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_DIMENSION && height <= MAX_DIMENSION {
        return (width, height);
    }
    let scale = |side: u32, longest: u32| {
        ((f64::from(side) * f64::from(MAX_DIMENSION)) / f64::from(longest)).round().max(1.0) as u32
    };
    if width >= height {
        (MAX_DIMENSION, scale(height, width))
    } else {
        (scale(width, height), MAX_DIMENSION)
    }
}

/// Decodes any supported image and returns a JPEG `data:` URL.
pub fn encode_thumbnail(data: &[u8]) -> Result<String> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AppError::Media(format!("reading image: {e}")))?
        .decode()
        .map_err(|e| AppError::Media(format!("decoding image: {e}")))?;

    let (w, h) = thumbnail_size(img.width(), img.height());
    let img = if (w, h) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(w, h, FilterType::Triangle)
    };

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&img.to_rgb8())
        .map_err(|e| AppError::Media(format!("encoding jpeg: {e}")))?;

    tracing::debug!(width = w, height = h, bytes = out.len(), "thumbnail encoded");
    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&out)))
}

/// Encodes the first `MAX_IMAGES` files concurrently on blocking tasks.
/// Any failure fails the whole batch.
pub async fn process_images(files: Vec<Bytes>) -> Result<Vec<String>> {
    if files.len() > MAX_IMAGES {
        tracing::warn!(given = files.len(), kept = MAX_IMAGES, "extra images ignored");
    }
    let tasks: Vec<_> = files
        .into_iter()
        .take(MAX_IMAGES)
        .map(|file| tokio::task::spawn_blocking(move || encode_thumbnail(&file)))
        .collect();

    let mut encoded = Vec::with_capacity(tasks.len());
    for task in tasks {
        let url = task
            .await
            .map_err(|e| AppError::Internal(format!("thumbnail task failed: {e}")))??;
        encoded.push(url);
    }
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};

    fn png(width: u32, height: u32) -> Bytes {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        Bytes::from(buf)
    }

    fn decoded_size(url: &str) -> (u32, u32) {
        let payload = url.strip_prefix("data:image/jpeg;base64,").unwrap();
        let jpeg = STANDARD.decode(payload).unwrap();
        let img = image::load_from_memory(&jpeg).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn sizes_keep_aspect_ratio() {
        assert_eq!(thumbnail_size(800, 600), (800, 600));
        assert_eq!(thumbnail_size(2160, 1080), (1080, 540));
        assert_eq!(thumbnail_size(1000, 3000), (360, 1080));
        assert_eq!(thumbnail_size(5000, 1), (1080, 1));
    }

    #[test]
    fn large_images_are_downscaled() {
        let url = encode_thumbnail(&png(2000, 1000)).unwrap();
        assert_eq!(decoded_size(&url), (1080, 540));
    }

    #[test]
    fn garbage_is_a_media_error() {
        assert!(matches!(encode_thumbnail(b"not an image"), Err(AppError::Media(_))));
    }

    #[tokio::test]
    async fn batch_is_capped_and_ordered() {
        let files: Vec<Bytes> = (1..=7).map(|i| png(10 * i, 10)).collect();
        let urls = process_images(files).await.unwrap();
        assert_eq!(urls.len(), MAX_IMAGES);
        assert_eq!(decoded_size(&urls[0]), (10, 10));
        assert_eq!(decoded_size(&urls[5]), (60, 10));
    }

    #[tokio::test]
    async fn one_bad_file_fails_the_batch() {
        let files = vec![png(20, 20), Bytes::from_static(b"broken")];
        assert!(process_images(files).await.is_err());
    }
}
