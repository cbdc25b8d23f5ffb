//! 라우트 정의.

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::AppState;

/// API 라우트 생성 (`/api` 하위)
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 세션 스냅샷 + 응답 기록
        .route("/state", get(handlers::api::get_state))
        // 미리보기 프레임 (image/jpeg)
        .route("/preview", get(handlers::api::get_preview))
}
