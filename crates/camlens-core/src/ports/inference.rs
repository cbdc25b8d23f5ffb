//! 원격 추론 포트.
//!
//! 구현: `camlens-network` crate (reqwest)

use async_trait::async_trait;

use crate::models::frame::NormalizedFrame;

/// 비전-언어 추론 클라이언트
///
/// 실패하지 않는다: 전송 실패나 비정상 상태 코드는
/// 사람이 읽을 수 있는 에러 문자열로 반환되어 응답 내용이 된다.
/// 재시도 없음, 실행당 1회 시도.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// 프레임 + 프롬프트 전송 후 응답 텍스트 반환
    async fn infer(&self, frame: &NormalizedFrame, prompt: &str, file_name: &str) -> String;
}
