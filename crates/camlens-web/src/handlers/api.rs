//! REST 핸들러: 세션 상태 조회, 미리보기 프레임, 헬스 체크.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use camlens_core::models::response::ResponseEntry;
use camlens_core::models::session::SessionSnapshot;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// `GET /api/state` 응답
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state: SessionSnapshot,
    pub history: Vec<ResponseEntry>,
}

/// `GET /health` 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub connected_clients: usize,
}

/// GET /api/state
pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    Json(StateResponse {
        state: state.control.snapshot(),
        history: state.control.history(),
    })
}

/// GET /api/preview
///
/// 미리보기 크기로 1장 캡처해 JPEG으로 반환. 기록에는 남지 않는다.
pub async fn get_preview(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let frame = state.control.preview().await?;
    debug!("미리보기 응답: {} bytes", frame.jpeg.len());

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        frame.jpeg,
    ))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connected_clients: state.hub.connected_count(),
    })
}
