//! 캡처 바이트 포맷 판별과 디코딩.
//!
//! 캡처 프로그램마다 출력 포맷이 다르다 (fswebcam/imagesnap은 JPEG, CommandCam은 BMP).
//! 파일 확장자 대신 앞쪽 매직 바이트로 디코더를 고른다.

use camlens_core::error::CoreError;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8];
const BMP_MAGIC: &[u8] = b"BM";
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47];

/// 매직 바이트로 판별한 입력 포맷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffedFormat {
    /// `FF D8`
    Jpeg,
    /// `42 4D` ("BM")
    Bmp,
    /// `89 50 4E 47`
    Png,
    /// 그 외: 범용 디코더가 내용으로 추측
    Unknown,
}

impl SniffedFormat {
    /// 전용 디코더 포맷 (Unknown은 None)
    pub fn image_format(self) -> Option<ImageFormat> {
        match self {
            Self::Jpeg => Some(ImageFormat::Jpeg),
            Self::Bmp => Some(ImageFormat::Bmp),
            Self::Png => Some(ImageFormat::Png),
            Self::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Bmp => "bmp",
            Self::Png => "png",
            Self::Unknown => "unknown",
        }
    }
}

/// 앞쪽 바이트로 포맷 판별
pub fn sniff(bytes: &[u8]) -> SniffedFormat {
    if bytes.starts_with(JPEG_MAGIC) {
        SniffedFormat::Jpeg
    } else if bytes.starts_with(BMP_MAGIC) {
        SniffedFormat::Bmp
    } else if bytes.starts_with(PNG_MAGIC) {
        SniffedFormat::Png
    } else {
        SniffedFormat::Unknown
    }
}

/// 판별된 포맷의 디코더로 디코딩.
///
/// 알 수 없는 포맷도 거부하지 않고 범용 디코더로 시도한다.
pub fn decode(bytes: &[u8]) -> Result<(DynamicImage, SniffedFormat), CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::Decode("입력이 비어 있음".to_string()));
    }

    let format = sniff(bytes);
    let decoded = match format.image_format() {
        Some(image_format) => image::load_from_memory_with_format(bytes, image_format),
        None => image::load_from_memory(bytes),
    };
    let image = decoded
        .map_err(|e| CoreError::Decode(format!("{} 디코딩 실패: {e}", format.as_str())))?;

    debug!(
        "디코딩: {} {} bytes → {}x{}",
        format.as_str(),
        bytes.len(),
        image.width(),
        image.height()
    );
    Ok((image, format))
}
