//! CAMLENS 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 타입을 그대로 반환하거나 자체 에러에서 래핑한다.
//! 추론 API 실패(업스트림)는 에러가 아니라 응답 텍스트로 표현되므로 여기에 없다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 캡처 장치 사용 불가 (장치 없음, 드라이버 오류, 0바이트 출력)
    #[error("카메라 에러: {0}")]
    Device(String),

    /// 이미지 디코딩 실패 (손상되었거나 읽을 수 없는 포맷)
    #[error("이미지 디코딩 실패: {0}")]
    Decode(String),

    /// 정규화된 프레임이 브로드캐스트 한도를 초과
    #[error("이미지가 너무 큼: {size} bytes (한도 {limit} bytes)")]
    SizeLimitExceeded {
        /// base64 인코딩 길이
        size: usize,
        /// 설정된 한도
        limit: usize,
    },

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 구독자 명령 해석 실패
    #[error("잘못된 명령: {0}")]
    InvalidCommand(String),

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}
