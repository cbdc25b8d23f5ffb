//! 구독자 허브.
//!
//! 모든 서버 → 구독자 이벤트는 여기서 한 번 JSON으로 직렬화된 뒤
//! `tokio::sync::broadcast`로 연결된 모든 구독자에게 팬아웃된다.
//! 연결 수는 [`Subscription`]의 생성/드롭으로만 바뀐다.

use camlens_core::models::response::ResponseEntry;
use camlens_core::models::session::SessionSnapshot;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error};

/// 직렬화 실패 시 대신 보내는 프레임
pub const INTERNAL_ERROR_FRAME: &str = r#"{"event":"error","data":"internal server error"}"#;

/// 직렬화된 이벤트 프레임 (구독자 간 공유)
pub type EventFrame = Arc<str>;

/// 서버 → 구독자 이벤트
///
/// 직렬화 형식: `{"event": "<name>", "data": <payload>}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum HubEvent {
    /// 세션 스냅샷
    StateUpdate(SessionSnapshot),
    /// 정규화 프레임 base64 (크기 초과 시 None → `null`)
    LiveImage(Option<String>),
    /// 새 응답 항목
    NewResponse(ResponseEntry),
    /// 전체 응답 기록
    ResponsesHistory(Vec<ResponseEntry>),
    /// 사람이 읽을 수 있는 에러 메시지
    Error(String),
}

impl HubEvent {
    /// 이벤트 이름 (로그용)
    pub fn name(&self) -> &'static str {
        match self {
            Self::StateUpdate(_) => "stateUpdate",
            Self::LiveImage(_) => "liveImage",
            Self::NewResponse(_) => "newResponse",
            Self::ResponsesHistory(_) => "responsesHistory",
            Self::Error(_) => "error",
        }
    }
}

/// 이벤트 직렬화: 실패하면 일반 내부 에러 프레임
pub fn encode_event(event: &HubEvent) -> EventFrame {
    match serde_json::to_string(event) {
        Ok(json) => Arc::from(json),
        Err(e) => {
            error!("이벤트 직렬화 실패 ({}): {e}", event.name());
            Arc::from(INTERNAL_ERROR_FRAME)
        }
    }
}

/// 구독자 허브
#[derive(Debug)]
pub struct Hub {
    tx: broadcast::Sender<EventFrame>,
    connected: AtomicUsize,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            connected: AtomicUsize::new(0),
        }
    }

    /// 새 구독: 연결 수 증가, 드롭 시 감소
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let rx = self.tx.subscribe();
        self.connected.fetch_add(1, Ordering::SeqCst);
        Subscription {
            hub: Arc::clone(self),
            rx,
        }
    }

    /// 현재 연결된 구독자 수
    pub fn connected_count(&self) -> usize {
        self.connected.load(Ordering::SeqCst)
    }

    /// 모든 구독자에게 발행. 받은 구독자 수 반환 (없으면 0).
    pub fn publish(&self, event: HubEvent) -> usize {
        let name = event.name();
        let frame = encode_event(&event);
        match self.tx.send(frame) {
            Ok(receivers) => {
                debug!(event = name, receivers, "이벤트 발행");
                receivers
            }
            Err(_) => {
                debug!(event = name, "구독자 없음, 이벤트 버림");
                0
            }
        }
    }
}

/// 허브 구독 핸들
#[derive(Debug)]
pub struct Subscription {
    hub: Arc<Hub>,
    rx: broadcast::Receiver<EventFrame>,
}

impl Subscription {
    /// 다음 이벤트 프레임 대기
    pub async fn recv(&mut self) -> Result<EventFrame, broadcast::error::RecvError> {
        self.rx.recv().await
    }

    /// 대기 없이 도착한 이벤트 하나 꺼내기
    pub fn try_recv(&mut self) -> Result<EventFrame, broadcast::error::TryRecvError> {
        self.rx.try_recv()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.connected.fetch_sub(1, Ordering::SeqCst);
    }
}
