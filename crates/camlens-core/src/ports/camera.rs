//! 캡처 장치 포트.
//!
//! 구현: `camlens-vision` crate (외부 캡처 프로그램)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::frame::RawCapture;

/// 프레임 소스: 물리 캡처 장치를 소유하고 요청 시 정지 이미지 1장 생성
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// 장치 사용 가능 여부.
    ///
    /// `false`면 컨트롤러가 캡처 시작을 거부한다.
    fn is_available(&self) -> bool;

    /// 프레임 1장 캡처.
    ///
    /// 장치 없음, 드라이버 오류, 0바이트 출력은 `CoreError::Device`.
    /// 동시 호출은 내부에서 직렬화된다.
    async fn capture(&self) -> Result<RawCapture, CoreError>;

    /// 시작 시 자가 테스트: 캡처 후 폐기.
    ///
    /// 결과는 관찰용이며 사용 가능 여부를 바꾸지 않는다.
    async fn self_test(&self) -> Result<(), CoreError>;

    /// 남은 임시 파일 일괄 정리 (최선 노력)
    async fn cleanup(&self);
}
