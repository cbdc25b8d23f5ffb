//! 사진 저장소.
//!
//! 구조: `<photos_dir>/capture_YYYYMMDD_HHMMSS_mmm.jpg`
//! 파일 이름은 프레임의 캡처 시각에서 만들어지며 추론 요청의 `file` 식별자와 같다.

use camlens_core::error::CoreError;
use camlens_core::models::frame::NormalizedFrame;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// 정규화 프레임 파일 저장소
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    /// 저장 디렉토리를 만들고 저장소 생성
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CoreError::Internal(format!("사진 디렉토리 생성 실패: {e}")))?;

        info!("사진 저장소 초기화: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// JPEG 저장 후 파일 경로 반환
    pub async fn save(&self, frame: &NormalizedFrame) -> Result<PathBuf, CoreError> {
        let path = self.dir.join(frame.file_name());

        fs::write(&path, &frame.jpeg)
            .await
            .map_err(|e| CoreError::Internal(format!("사진 저장 실패 ({}): {e}", path.display())))?;

        debug!("사진 저장: {} ({}bytes)", path.display(), frame.jpeg.len());
        Ok(path)
    }
}
