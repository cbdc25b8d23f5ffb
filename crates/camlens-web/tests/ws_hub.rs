//! WebSocket 구독자 채널 통합 테스트.
//!
//! 실제 TCP 포트에 라우터를 띄우고 tokio-tungstenite 클라이언트로 접속한다.

use async_trait::async_trait;
use camlens_core::error::CoreError;
use camlens_core::models::frame::NormalizedFrame;
use camlens_core::models::response::{ResponseEntry, ResponseHistory};
use camlens_core::models::session::{CaptureSession, SessionCommand, SessionSnapshot};
use camlens_core::ports::session::SessionControl;
use camlens_web::{router, AppState, Hub, HubEvent};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 카메라 없는 간단한 세션 제어
struct FakeControl {
    hub: Arc<Hub>,
    session: Mutex<CaptureSession>,
    history: Mutex<ResponseHistory>,
    camera_available: bool,
}

impl FakeControl {
    fn new(hub: Arc<Hub>, camera_available: bool) -> Self {
        let mut history = ResponseHistory::new(0);
        history.push(
            "2026-10-16 09:00:00".into(),
            "capture_20261016_090000_000.jpg".into(),
            None,
            "What is in this picture?",
            "A mug".into(),
        );
        Self {
            hub,
            session: Mutex::new(CaptureSession::new(5, "What is in this picture?")),
            history: Mutex::new(history),
            camera_available,
        }
    }
}

#[async_trait]
impl SessionControl for FakeControl {
    fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot(self.hub.connected_count())
    }

    fn history(&self) -> Vec<ResponseEntry> {
        self.history.lock().snapshot()
    }

    async fn execute(&self, command: SessionCommand) -> Result<(), CoreError> {
        match command {
            SessionCommand::StartCapture { .. } if !self.camera_available => {
                return Err(CoreError::Device("카메라 없음".into()));
            }
            SessionCommand::StartCapture { .. } => self.session.lock().is_capturing = true,
            SessionCommand::StopCapture => self.session.lock().is_capturing = false,
            SessionCommand::UpdatePrompt(prompt) => self.session.lock().prompt = prompt,
            SessionCommand::ClearHistory => {
                self.history.lock().clear();
                self.hub.publish(HubEvent::ResponsesHistory(Vec::new()));
            }
        }
        self.hub.publish(HubEvent::StateUpdate(self.snapshot()));
        Ok(())
    }

    async fn preview(&self) -> Result<NormalizedFrame, CoreError> {
        if self.camera_available {
            Ok(NormalizedFrame::new(
                vec![0xFF, 0xD8, 0xFF, 0xD9],
                640,
                480,
                chrono::Local::now(),
            ))
        } else {
            Err(CoreError::Device("카메라 없음".into()))
        }
    }
}

async fn spawn_server(camera_available: bool) -> (SocketAddr, Arc<Hub>) {
    let hub = Arc::new(Hub::new(64));
    let control = Arc::new(FakeControl::new(hub.clone(), camera_available));
    let app = router(
        AppState {
            hub: hub.clone(),
            control,
        },
        None,
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hub)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();
    client
}

async fn next_event(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("이벤트 대기 시간 초과")
            .expect("스트림 종료")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// 연결 직후 받는 stateUpdate + responsesHistory 소비
async fn skip_greeting(client: &mut Client) {
    assert_eq!(next_event(client).await["event"], "stateUpdate");
    assert_eq!(next_event(client).await["event"], "responsesHistory");
}

async fn send_command(client: &mut Client, command: Value) {
    client
        .send(Message::text(command.to_string()))
        .await
        .unwrap();
}

async fn assert_silent(client: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(300), client.next()).await;
    assert!(result.is_err(), "예상치 못한 이벤트: {result:?}");
}

#[tokio::test]
async fn new_subscriber_gets_state_then_history() {
    let (addr, _hub) = spawn_server(true).await;
    let mut client = connect(addr).await;

    let state = next_event(&mut client).await;
    assert_eq!(state["event"], "stateUpdate");
    assert_eq!(state["data"]["isCapturing"], false);
    assert_eq!(state["data"]["intervalSeconds"], 5);
    assert_eq!(state["data"]["connectedClients"], 1);

    let history = next_event(&mut client).await;
    assert_eq!(history["event"], "responsesHistory");
    assert_eq!(history["data"][0]["id"], 1);
    assert_eq!(history["data"][0]["fullResponse"], "A mug");
}

#[tokio::test]
async fn state_changes_reach_every_subscriber() {
    let (addr, _hub) = spawn_server(true).await;
    let mut a = connect(addr).await;
    skip_greeting(&mut a).await;
    let mut b = connect(addr).await;
    skip_greeting(&mut b).await;

    send_command(
        &mut a,
        json!({"command": "updatePrompt", "data": "Count the cups"}),
    )
    .await;

    for client in [&mut a, &mut b] {
        let event = next_event(client).await;
        assert_eq!(event["event"], "stateUpdate");
        assert_eq!(event["data"]["prompt"], "Count the cups");
        assert_eq!(event["data"]["connectedClients"], 2);
    }
}

#[tokio::test]
async fn command_error_goes_only_to_sender() {
    let (addr, _hub) = spawn_server(false).await;
    let mut a = connect(addr).await;
    skip_greeting(&mut a).await;
    let mut b = connect(addr).await;
    skip_greeting(&mut b).await;

    send_command(
        &mut a,
        json!({"command": "startCapture", "data": {"seconds": 5, "prompt": "Describe this"}}),
    )
    .await;

    let event = next_event(&mut a).await;
    assert_eq!(event["event"], "error");
    assert!(event["data"].as_str().unwrap().contains("카메라 없음"));
    assert_silent(&mut b).await;
}

#[tokio::test]
async fn malformed_command_reports_error() {
    let (addr, _hub) = spawn_server(true).await;
    let mut client = connect(addr).await;
    skip_greeting(&mut client).await;

    client.send(Message::text("not json")).await.unwrap();
    assert_eq!(next_event(&mut client).await["event"], "error");

    send_command(&mut client, json!({"command": "reboot"})).await;
    assert_eq!(next_event(&mut client).await["event"], "error");
}

#[tokio::test]
async fn clear_history_broadcasts_empty_history() {
    let (addr, _hub) = spawn_server(true).await;
    let mut client = connect(addr).await;
    skip_greeting(&mut client).await;

    send_command(&mut client, json!({"command": "clearHistory", "data": {}})).await;

    let history = next_event(&mut client).await;
    assert_eq!(history["event"], "responsesHistory");
    assert_eq!(history["data"], json!([]));
    assert_eq!(next_event(&mut client).await["event"], "stateUpdate");
}

#[tokio::test]
async fn disconnect_decrements_connected_count() {
    let (addr, hub) = spawn_server(true).await;
    let mut a = connect(addr).await;
    skip_greeting(&mut a).await;
    let mut b = connect(addr).await;
    skip_greeting(&mut b).await;
    assert_eq!(hub.connected_count(), 2);

    b.close(None).await.unwrap();
    drop(b);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while hub.connected_count() != 1 {
        assert!(tokio::time::Instant::now() < deadline, "연결 수가 줄지 않음");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn preview_endpoint_returns_jpeg() {
    let (addr, _hub) = spawn_server(true).await;
    let response = reqwest::get(format!("http://{addr}/api/preview"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "image/jpeg"
    );
    assert_eq!(
        response.bytes().await.unwrap().to_vec(),
        vec![0xFF, 0xD8, 0xFF, 0xD9]
    );
}

#[tokio::test]
async fn preview_without_camera_is_unavailable() {
    let (addr, _hub) = spawn_server(false).await;
    let response = reqwest::get(format!("http://{addr}/api/preview"))
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
}
