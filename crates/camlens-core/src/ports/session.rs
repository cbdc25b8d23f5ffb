//! 세션 제어 포트.
//!
//! 구독자 채널(웹 crate)이 컨트롤러(앱 crate)에 요구하는 기능.
//! 구현: `camlens-app`의 `CaptureController`

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::frame::NormalizedFrame;
use crate::models::response::ResponseEntry;
use crate::models::session::{SessionCommand, SessionSnapshot};

/// 세션 제어: 스냅샷 조회와 명령 실행
#[async_trait]
pub trait SessionControl: Send + Sync {
    /// 현재 세션 스냅샷 (연결 수 포함)
    fn snapshot(&self) -> SessionSnapshot;

    /// 응답 기록 전체 (순서 유지)
    fn history(&self) -> Vec<ResponseEntry>;

    /// 세션 명령 실행.
    ///
    /// 에러는 명령을 보낸 구독자에게만 전달된다.
    async fn execute(&self, command: SessionCommand) -> Result<(), CoreError>;

    /// 미리보기 프레임 1장 캡처
    async fn preview(&self) -> Result<NormalizedFrame, CoreError>;
}
