//! WebSocket 구독자 채널.
//!
//! GET /ws
//!
//! 연결 직후 새 구독자에게만 현재 세션 스냅샷과 전체 응답 기록을 보낸다.
//! 이후 허브 이벤트를 그대로 전달하고, 들어오는 텍스트 프레임은 세션 명령으로 해석한다.
//! 명령 에러는 보낸 구독자에게만 `error` 이벤트로 돌아간다.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use camlens_core::models::session::SessionCommand;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::hub::{encode_event, EventFrame, HubEvent};
use crate::AppState;

/// 구독자별 직접 응답 버퍼
const REPLY_CAPACITY: usize = 16;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut subscription = state.hub.subscribe();
    info!("구독자 연결 (총 {}명)", state.hub.connected_count());

    let (mut sink, mut stream) = socket.split();

    let greeting = [
        encode_event(&HubEvent::StateUpdate(state.control.snapshot())),
        encode_event(&HubEvent::ResponsesHistory(state.control.history())),
    ];
    for frame in greeting {
        if sink.send(text_message(&frame)).await.is_err() {
            debug!("초기 상태 전송 실패, 연결 종료");
            return;
        }
    }

    let (reply_tx, mut reply_rx) = mpsc::channel::<EventFrame>(REPLY_CAPACITY);

    // 허브 이벤트 + 직접 응답 → 소켓
    let mut send_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                received = subscription.recv() => match received {
                    Ok(frame) => frame,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("구독자 지연: 이벤트 {skipped}개 건너뜀");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                reply = reply_rx.recv() => match reply {
                    Some(frame) => frame,
                    None => break,
                },
            };

            if sink.send(text_message(&frame)).await.is_err() {
                break;
            }
        }
    });

    // 소켓 → 세션 명령
    let control = state.control.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => {
                    let result = match SessionCommand::parse(text.as_str()) {
                        Ok(command) => {
                            debug!(command = command.name(), "명령 수신");
                            control.execute(command).await
                        }
                        Err(e) => Err(e),
                    };

                    if let Err(e) = result {
                        warn!("명령 처리 실패: {e}");
                        let frame = encode_event(&HubEvent::Error(e.to_string()));
                        if reply_tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("구독자 연결 종료");
}

fn text_message(frame: &EventFrame) -> Message {
    Message::Text(frame.as_ref().into())
}
