//! 비전(이미지 정규화) 포트.
//!
//! 구현: `camlens-vision` crate (image, fast_image_resize)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::frame::{NormalizedFrame, RawCapture};

/// 프레임 정규화기: 포맷 스니핑 → 디코딩 → 커버 리사이즈/중앙 크롭 → JPEG
#[async_trait]
pub trait FrameNormalizer: Send + Sync {
    /// 고정 크기 정사각형 JPEG으로 정규화.
    ///
    /// 디코딩 불가 시 `CoreError::Decode`.
    async fn normalize(&self, raw: RawCapture) -> Result<NormalizedFrame, CoreError>;

    /// 미리보기 크기/품질로 정규화
    async fn normalize_preview(&self, raw: RawCapture) -> Result<NormalizedFrame, CoreError>;
}
