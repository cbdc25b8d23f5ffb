//! 애플리케이션 설정 구조체.
//!
//! 웹 서버 포트, 추론 엔드포인트, 캡처 장치, 정규화 크기/품질, 세션 기본값,
//! 사진 저장 경로 등 런타임 설정을 정의한다.
//! 로드는 [`crate::config_manager`]가 `config` crate로 수행한다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 웹/WebSocket 서버 설정
    #[serde(default)]
    pub web: WebConfig,
    /// 원격 추론 API 설정
    #[serde(default)]
    pub inference: InferenceConfig,
    /// 캡처 장치 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 이미지 정규화 설정
    #[serde(default)]
    pub vision: VisionConfig,
    /// 캡처 세션 기본값
    #[serde(default)]
    pub session: SessionConfig,
    /// 사진 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

// ============================================================
// 웹 서버 설정
// ============================================================

/// 웹 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// 서버 포트 (기본: 3000)
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// 외부 접근 허용 여부 (false: 127.0.0.1 only)
    #[serde(default = "default_true")]
    pub allow_external: bool,
    /// 정적 파일 디렉토리 (브라우저 클라이언트)
    #[serde(default = "default_public_dir")]
    pub public_dir: Option<PathBuf>,
    /// 허브 브로드캐스트 채널 용량
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            allow_external: true,
            public_dir: default_public_dir(),
            event_capacity: default_event_capacity(),
        }
    }
}

// ============================================================
// 추론 API 설정
// ============================================================

/// 원격 비전-언어 추론 API 설정
///
/// 요청 타임아웃은 두지 않는다 (HTTP 클라이언트 기본값, 1회 시도).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// POST 엔드포인트 URL
    #[serde(default = "default_inference_endpoint")]
    pub endpoint: String,
    /// 요청 본문의 고정 모델 이름
    #[serde(default = "default_inference_model")]
    pub model: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_inference_endpoint(),
            model: default_inference_model(),
        }
    }
}

// ============================================================
// 캡처 장치 설정
// ============================================================

/// 캡처 장치 설정: 외부 캡처 프로그램 기반
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 캡처 프로그램 (None이면 플랫폼 기본값)
    #[serde(default)]
    pub program: Option<String>,
    /// 인자 템플릿 (`{output}`, `{width}`, `{height}`, `{device}` 치환)
    #[serde(default)]
    pub args: Option<Vec<String>>,
    /// 장치 이름/경로 (None이면 기본 장치)
    #[serde(default)]
    pub device: Option<String>,
    /// 캡처 해상도 너비
    #[serde(default = "default_capture_width")]
    pub width: u32,
    /// 캡처 해상도 높이
    #[serde(default = "default_capture_height")]
    pub height: u32,
    /// 임시 캡처 파일 디렉토리
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// 시작 시 자가 테스트 수행 여부
    #[serde(default = "default_true")]
    pub self_test: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: None,
            device: None,
            width: default_capture_width(),
            height: default_capture_height(),
            temp_dir: default_temp_dir(),
            self_test: true,
        }
    }
}

// ============================================================
// 이미지 정규화 설정
// ============================================================

/// 비전(이미지 정규화) 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// 정규화 정사각형 한 변 (픽셀)
    #[serde(default = "default_target_size")]
    pub target_size: u32,
    /// 정규화 JPEG 품질 (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// 미리보기 너비
    #[serde(default = "default_preview_width")]
    pub preview_width: u32,
    /// 미리보기 높이
    #[serde(default = "default_preview_height")]
    pub preview_height: u32,
    /// 미리보기 JPEG 품질 (1-100)
    #[serde(default = "default_preview_quality")]
    pub preview_quality: u8,
    /// base64 페이로드 상한 (바이트)
    #[serde(default = "default_max_base64_bytes")]
    pub max_base64_bytes: usize,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            jpeg_quality: default_jpeg_quality(),
            preview_width: default_preview_width(),
            preview_height: default_preview_height(),
            preview_quality: default_preview_quality(),
            max_base64_bytes: default_max_base64_bytes(),
        }
    }
}

// ============================================================
// 세션 기본값
// ============================================================

/// 캡처 세션 기본값
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// 시작 명령에 간격이 없을 때 사용할 값 (초)
    #[serde(default = "default_interval_secs")]
    pub default_interval_secs: u64,
    /// 시작 명령에 프롬프트가 없을 때 사용할 값
    #[serde(default = "default_prompt")]
    pub default_prompt: String,
    /// 메모리에 보관할 응답 기록 최대 개수
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_interval_secs: default_interval_secs(),
            default_prompt: default_prompt(),
            history_limit: default_history_limit(),
        }
    }
}

// ============================================================
// 사진 저장소 설정
// ============================================================

/// 사진 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 정규화된 프레임을 디스크에 보관할지 여부
    #[serde(default = "default_true")]
    pub persist_photos: bool,
    /// 사진 디렉토리
    #[serde(default = "default_photos_dir")]
    pub photos_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persist_photos: true,
            photos_dir: default_photos_dir(),
        }
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 기본 캡처 간격을 Duration으로 반환
    pub fn default_interval(&self) -> Duration {
        Duration::from_secs(self.session.default_interval_secs)
    }

    /// 값 범위 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.vision.target_size == 0 {
            return Err(CoreError::Config("vision.target_size는 0일 수 없음".into()));
        }
        if self.vision.preview_width == 0 || self.vision.preview_height == 0 {
            return Err(CoreError::Config("미리보기 크기는 0일 수 없음".into()));
        }
        for (name, quality) in [
            ("vision.jpeg_quality", self.vision.jpeg_quality),
            ("vision.preview_quality", self.vision.preview_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(CoreError::Config(format!(
                    "{name}는 1-100 범위여야 함 (현재 {quality})"
                )));
            }
        }
        if self.vision.max_base64_bytes == 0 {
            return Err(CoreError::Config(
                "vision.max_base64_bytes는 0일 수 없음".into(),
            ));
        }
        if self.session.default_interval_secs == 0 {
            return Err(CoreError::Config(
                "session.default_interval_secs는 0일 수 없음".into(),
            ));
        }
        if self.inference.endpoint.trim().is_empty() {
            return Err(CoreError::Config("inference.endpoint 미설정".into()));
        }
        Ok(())
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}
fn default_web_port() -> u16 {
    3000
}
fn default_public_dir() -> Option<PathBuf> {
    Some(PathBuf::from("public"))
}
fn default_event_capacity() -> usize {
    256
}
fn default_inference_endpoint() -> String {
    "http://localhost:8000/llava".to_string()
}
fn default_inference_model() -> String {
    "llava:7b".to_string()
}
fn default_capture_width() -> u32 {
    1280
}
fn default_capture_height() -> u32 {
    720
}
fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}
fn default_target_size() -> u32 {
    672
}
fn default_jpeg_quality() -> u8 {
    80
}
fn default_preview_width() -> u32 {
    640
}
fn default_preview_height() -> u32 {
    480
}
fn default_preview_quality() -> u8 {
    70
}
fn default_max_base64_bytes() -> usize {
    800_000
}
fn default_interval_secs() -> u64 {
    5
}
fn default_prompt() -> String {
    "What is in this picture?".to_string()
}
fn default_history_limit() -> usize {
    500
}
fn default_photos_dir() -> PathBuf {
    PathBuf::from("photos")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default_config();
        assert_eq!(config.web.port, 3000);
        assert_eq!(config.vision.target_size, 672);
        assert_eq!(config.vision.jpeg_quality, 80);
        assert_eq!(config.vision.max_base64_bytes, 800_000);
        assert_eq!(config.inference.model, "llava:7b");
        assert_eq!(config.default_interval(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.capture.width, 1280);
        assert_eq!(config.session.default_prompt, "What is in this picture?");
        assert!(config.storage.persist_photos);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"vision": {"target_size": 336}}"#).unwrap();
        assert_eq!(config.vision.target_size, 336);
        assert_eq!(config.vision.jpeg_quality, 80);
    }

    #[test]
    fn validate_rejects_bad_quality() {
        let mut config = AppConfig::default_config();
        config.vision.jpeg_quality = 0;
        assert!(config.validate().is_err());
        config.vision.jpeg_quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval_and_ceiling() {
        let mut config = AppConfig::default_config();
        config.session.default_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default_config();
        config.vision.max_base64_bytes = 0;
        assert!(config.validate().is_err());
    }
}
