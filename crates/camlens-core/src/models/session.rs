//! 캡처 세션 모델.
//!
//! 프로세스 전역에 하나뿐인 캡처/대기 상태와,
//! 구독자가 보내는 세션 명령을 정의한다.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 캡처 세션 상태: 컨트롤러만 변경한다
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSession {
    /// 주기 캡처 진행 중 여부
    pub is_capturing: bool,
    /// 캡처 간격 (초, 0 초과)
    pub interval_seconds: u64,
    /// 추론 프롬프트
    pub prompt: String,
}

impl CaptureSession {
    /// 대기 상태의 새 세션
    pub fn new(interval_seconds: u64, prompt: impl Into<String>) -> Self {
        Self {
            is_capturing: false,
            interval_seconds: interval_seconds.max(1),
            prompt: prompt.into(),
        }
    }

    /// 외부 관찰자용 불변 스냅샷
    pub fn snapshot(&self, connected_clients: usize) -> SessionSnapshot {
        SessionSnapshot {
            is_capturing: self.is_capturing,
            interval_seconds: self.interval_seconds,
            prompt: self.prompt.clone(),
            connected_clients,
        }
    }
}

/// `stateUpdate` 페이로드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub is_capturing: bool,
    pub interval_seconds: u64,
    pub prompt: String,
    pub connected_clients: usize,
}

/// 구독자 → 서버 세션 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// 주기 캡처 시작 (값이 없으면 설정 기본값)
    StartCapture {
        seconds: Option<u64>,
        prompt: Option<String>,
    },
    /// 주기 캡처 중지
    StopCapture,
    /// 다음 실행부터 적용될 프롬프트 변경
    UpdatePrompt(String),
    /// 응답 기록 전체 삭제
    ClearHistory,
}

/// 명령 봉투: `{"command": "...", "data": ...}`
#[derive(Debug, Deserialize)]
struct CommandEnvelope {
    command: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct StartCaptureData {
    #[serde(default)]
    seconds: Option<u64>,
    #[serde(default)]
    prompt: Option<String>,
}

impl SessionCommand {
    /// JSON 텍스트 프레임 해석
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let envelope: CommandEnvelope = serde_json::from_str(text)
            .map_err(|e| CoreError::InvalidCommand(format!("JSON 파싱 실패: {e}")))?;

        match envelope.command.as_str() {
            "startCapture" => {
                let data: StartCaptureData = if envelope.data.is_null() {
                    StartCaptureData::default()
                } else {
                    serde_json::from_value(envelope.data).map_err(|e| {
                        CoreError::InvalidCommand(format!("startCapture 데이터 오류: {e}"))
                    })?
                };
                Ok(Self::StartCapture {
                    seconds: data.seconds,
                    prompt: data.prompt,
                })
            }
            "stopCapture" => Ok(Self::StopCapture),
            "updatePrompt" => match envelope.data {
                serde_json::Value::String(prompt) => Ok(Self::UpdatePrompt(prompt)),
                other => Err(CoreError::InvalidCommand(format!(
                    "updatePrompt는 문자열이 필요함: {other}"
                ))),
            },
            "clearHistory" => Ok(Self::ClearHistory),
            other => Err(CoreError::InvalidCommand(format!("알 수 없는 명령: {other}"))),
        }
    }

    /// 명령 이름 (로그용)
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartCapture { .. } => "startCapture",
            Self::StopCapture => "stopCapture",
            Self::UpdatePrompt(_) => "updatePrompt",
            Self::ClearHistory => "clearHistory",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_serializes_camel_case() {
        let session = CaptureSession::new(5, "What is in this picture?");
        let json = serde_json::to_string(&session.snapshot(2)).unwrap();
        assert!(json.contains("\"isCapturing\":false"));
        assert!(json.contains("\"intervalSeconds\":5"));
        assert!(json.contains("\"connectedClients\":2"));
    }

    #[test]
    fn interval_never_zero() {
        let session = CaptureSession::new(0, "x");
        assert_eq!(session.interval_seconds, 1);
    }

    #[test]
    fn parse_start_capture() {
        let cmd = SessionCommand::parse(
            r#"{"command":"startCapture","data":{"seconds":5,"prompt":"Describe this"}}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            SessionCommand::StartCapture {
                seconds: Some(5),
                prompt: Some("Describe this".to_string()),
            }
        );
    }

    #[test]
    fn parse_start_capture_without_data() {
        let cmd = SessionCommand::parse(r#"{"command":"startCapture"}"#).unwrap();
        assert_eq!(
            cmd,
            SessionCommand::StartCapture {
                seconds: None,
                prompt: None
            }
        );
    }

    #[test]
    fn parse_unit_commands_ignore_data() {
        assert_eq!(
            SessionCommand::parse(r#"{"command":"stopCapture","data":{}}"#).unwrap(),
            SessionCommand::StopCapture
        );
        assert_eq!(
            SessionCommand::parse(r#"{"command":"clearHistory"}"#).unwrap(),
            SessionCommand::ClearHistory
        );
    }

    #[test]
    fn parse_update_prompt() {
        let cmd = SessionCommand::parse(r#"{"command":"updatePrompt","data":"Count the cups"}"#)
            .unwrap();
        assert_eq!(cmd, SessionCommand::UpdatePrompt("Count the cups".into()));
        assert_eq!(cmd.name(), "updatePrompt");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(SessionCommand::parse("not json").is_err());
        assert!(SessionCommand::parse(r#"{"command":"reboot"}"#).is_err());
        assert!(SessionCommand::parse(r#"{"command":"updatePrompt","data":42}"#).is_err());
        assert!(
            SessionCommand::parse(r#"{"command":"startCapture","data":{"seconds":"five"}}"#)
                .is_err()
        );
    }
}
