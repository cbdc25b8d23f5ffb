//! 프레임 모델.
//!
//! 캡처 장치가 만든 원본 바이트([`RawCapture`])와
//! 고정 크기 JPEG으로 정규화된 결과([`NormalizedFrame`]).

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use chrono::{DateTime, Local};

/// 캡처 원본: 인코딩 포맷은 스니핑 전까지 알 수 없음 (JPEG/BMP/PNG/기타)
#[derive(Debug, Clone)]
pub struct RawCapture {
    /// 캡처 파일 바이트
    pub bytes: Vec<u8>,
    /// 캡처 시각
    pub captured_at: DateTime<Local>,
}

impl RawCapture {
    /// 현재 시각으로 새 캡처 생성
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            captured_at: Local::now(),
        }
    }

    /// 바이트 길이
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// 빈 캡처 여부
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 정규화된 프레임: 고정 크기 JPEG + base64 텍스트
#[derive(Debug, Clone)]
pub struct NormalizedFrame {
    /// JPEG 바이트
    pub jpeg: Vec<u8>,
    /// JPEG의 base64 인코딩 (STANDARD, 패딩 포함)
    pub base64: String,
    /// 출력 너비
    pub width: u32,
    /// 출력 높이
    pub height: u32,
    /// 원본 캡처 시각
    pub captured_at: DateTime<Local>,
}

impl NormalizedFrame {
    /// JPEG 바이트로부터 생성 (base64 계산 포함)
    pub fn new(jpeg: Vec<u8>, width: u32, height: u32, captured_at: DateTime<Local>) -> Self {
        let base64 = B64.encode(&jpeg);
        Self {
            jpeg,
            base64,
            width,
            height,
            captured_at,
        }
    }

    /// base64 페이로드 길이 (크기 가드 기준)
    pub fn base64_len(&self) -> usize {
        self.base64.len()
    }

    /// 캡처 시각 기반 파일 이름: `capture_YYYYMMDD_HHMMSS_mmm.jpg`
    pub fn file_name(&self) -> String {
        format!("capture_{}.jpg", self.captured_at.format("%Y%m%d_%H%M%S_%3f"))
    }
}
