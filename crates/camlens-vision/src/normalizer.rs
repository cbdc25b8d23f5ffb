//! 프레임 정규화기.
//!
//! `FrameNormalizer` 포트 구현. 디코딩/리사이즈/인코딩은 CPU 작업이므로
//! `spawn_blocking`에서 실행한다.

use async_trait::async_trait;
use camlens_core::config::VisionConfig;
use camlens_core::error::CoreError;
use camlens_core::models::frame::{NormalizedFrame, RawCapture};
use camlens_core::ports::vision::FrameNormalizer;
use tracing::debug;

use crate::encoder;
use crate::format;
use crate::resize;

/// 출력 프레임 크기와 JPEG 품질
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTarget {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

/// 캡처 바이트 → 목표 크기 JPEG (동기)
pub fn normalize_bytes(bytes: &[u8], target: FrameTarget) -> Result<Vec<u8>, CoreError> {
    let (image, sniffed) = format::decode(bytes)?;
    let (src_w, src_h) = (image.width(), image.height());

    let resized = resize::cover_resize(&image, target.width, target.height)?;
    let jpeg = encoder::encode_jpeg(&resized, target.quality)?;

    debug!(
        "프레임 정규화: {} {}x{} → {}x{} JPEG {} bytes",
        sniffed.as_str(),
        src_w,
        src_h,
        target.width,
        target.height,
        jpeg.len()
    );
    Ok(jpeg)
}

/// JPEG 정규화기: `FrameNormalizer` 포트 구현
#[derive(Debug, Clone)]
pub struct JpegNormalizer {
    frame: FrameTarget,
    preview: FrameTarget,
}

impl JpegNormalizer {
    pub fn new(frame: FrameTarget, preview: FrameTarget) -> Self {
        Self { frame, preview }
    }

    /// 설정에서 생성 (추론용은 정사각형)
    pub fn from_config(config: &VisionConfig) -> Self {
        Self::new(
            FrameTarget {
                width: config.target_size,
                height: config.target_size,
                quality: config.jpeg_quality,
            },
            FrameTarget {
                width: config.preview_width,
                height: config.preview_height,
                quality: config.preview_quality,
            },
        )
    }

    async fn run(&self, raw: RawCapture, target: FrameTarget) -> Result<NormalizedFrame, CoreError> {
        let captured_at = raw.captured_at;
        let jpeg = tokio::task::spawn_blocking(move || normalize_bytes(&raw.bytes, target))
            .await
            .map_err(|e| CoreError::Internal(format!("정규화 작업 실패: {e}")))??;

        Ok(NormalizedFrame::new(
            jpeg,
            target.width,
            target.height,
            captured_at,
        ))
    }
}

#[async_trait]
impl FrameNormalizer for JpegNormalizer {
    async fn normalize(&self, raw: RawCapture) -> Result<NormalizedFrame, CoreError> {
        self.run(raw, self.frame).await
    }

    async fn normalize_preview(&self, raw: RawCapture) -> Result<NormalizedFrame, CoreError> {
        self.run(raw, self.preview).await
    }
}
