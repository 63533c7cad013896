//! Normalization of downloaded images into the cached JPEG form.

use image::{ColorType, DynamicImage, codecs::jpeg::JpegEncoder, imageops::FilterType};

/// Content type of every transformed image.
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("missing content type")]
    MissingContentType,
    #[error("not an image content type: {0}")]
    NotAnImage(String),
    #[error("decode failed: {0}")]
    Decode(#[source] image::ImageError),
    #[error("encode failed: {0}")]
    Encode(#[source] image::ImageError),
}

/// Re-encoded image ready for caching.
#[derive(Debug, Clone)]
pub struct TransformedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub content_type: &'static str,
}

/// Decodes, flattens, bounds and re-encodes an image.
///
/// - Rejects any declared content type outside `image/*`.
/// - Anything other than 8-bit RGB or grayscale (alpha, palette, 16-bit) is
///   converted to RGB.
/// - Images larger than `max_dimension` on either edge are downscaled with
///   Lanczos3, keeping the aspect ratio.
/// - The result is always JPEG at `quality`.
///
/// # Errors
///
/// Returns a [`TransformError`] when the content type is wrong or the bytes
/// cannot be decoded or encoded.
pub fn transform(
    bytes: &[u8],
    declared_content_type: Option<&str>,
    max_dimension: u32,
    quality: u8,
) -> Result<TransformedImage, TransformError> {
    let content_type = declared_content_type.ok_or(TransformError::MissingContentType)?;
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !mime.starts_with("image/") {
        return Err(TransformError::NotAnImage(content_type.to_string()));
    }

    let mut img = image::load_from_memory(bytes).map_err(TransformError::Decode)?;

    if !matches!(img.color(), ColorType::Rgb8 | ColorType::L8) {
        img = DynamicImage::ImageRgb8(img.to_rgb8());
    }

    if img.width() > max_dimension || img.height() > max_dimension {
        img = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
    }

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    img.write_with_encoder(encoder)
        .map_err(TransformError::Encode)?;

    Ok(TransformedImage {
        bytes: out,
        width: img.width(),
        height: img.height(),
        content_type: OUTPUT_CONTENT_TYPE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
        let canvas = RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 128]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_downscales_preserving_aspect_ratio() {
        let result = transform(&png_with_alpha(800, 400), Some("image/png"), 400, 85).unwrap();

        assert_eq!((result.width, result.height), (400, 200));
        assert_eq!(result.content_type, "image/jpeg");
    }

    #[test]
    fn test_output_is_decodable_jpeg_without_alpha() {
        let result = transform(&png_with_alpha(50, 30), Some("image/png"), 400, 85).unwrap();

        assert_eq!(&result.bytes[..3], &[0xFF, 0xD8, 0xFF]);
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8);
        assert_eq!((decoded.width(), decoded.height()), (50, 30));
    }

    #[test]
    fn test_accepts_content_type_parameters() {
        let result = transform(
            &png_with_alpha(10, 10),
            Some("Image/PNG; charset=binary"),
            400,
            85,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_rejects_non_image_content_type() {
        let result = transform(&png_with_alpha(10, 10), Some("text/html"), 400, 85);
        assert!(matches!(result, Err(TransformError::NotAnImage(_))));
    }

    #[test]
    fn test_rejects_missing_content_type() {
        let result = transform(&png_with_alpha(10, 10), None, 400, 85);
        assert!(matches!(result, Err(TransformError::MissingContentType)));
    }

    #[test]
    fn test_rejects_undecodable_bytes() {
        let result = transform(b"<html>nope</html>", Some("image/jpeg"), 400, 85);
        assert!(matches!(result, Err(TransformError::Decode(_))));
    }
}
