//! JPEG 인코더.

use camlens_core::error::CoreError;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

/// JPEG 인코딩 (품질 1-100, 범위 밖은 잘라냄)
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CoreError> {
    let rgb = image.to_rgb8();
    let quality = quality.clamp(1, 100);

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(|e| CoreError::Internal(format!("JPEG 인코딩 실패: {e}")))?;

    debug!(
        "JPEG 인코딩: {}x{} → {} bytes (품질 {})",
        rgb.width(),
        rgb.height(),
        buf.len(),
        quality
    );
    Ok(buf)
}
