//! # camlens-web
//!
//! 구독자 허브 서버.
//! Axum 기반 WebSocket 이벤트 채널 + REST API + 정적 파일 서빙.
//!
//! ## 기능
//! - `GET /ws`: 세션 이벤트 팬아웃과 세션 명령 수신
//! - `GET /api/state`: 세션 스냅샷과 응답 기록
//! - `GET /api/preview`: 미리보기 프레임 (JPEG)
//! - `GET /health`: 헬스 체크
//! - 그 외 경로: `public_dir` 정적 파일

pub mod error;
pub mod handlers;
pub mod hub;
pub mod routes;

use axum::routing::get;
use axum::Router;
use camlens_core::config::WebConfig;
use camlens_core::ports::session::SessionControl;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub use hub::{encode_event, Hub, HubEvent, Subscription};

/// 포트 바인드 최대 시도 횟수
const MAX_PORT_ATTEMPTS: u16 = 10;

/// 웹 서버 애플리케이션 상태
#[derive(Clone)]
pub struct AppState {
    /// 구독자 허브
    pub hub: Arc<Hub>,
    /// 세션 제어 (캡처 컨트롤러)
    pub control: Arc<dyn SessionControl>,
}

/// 라우터 구성
pub fn router(state: AppState, public_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/ws", get(handlers::socket::ws_handler))
        .route("/health", get(handlers::api::health))
        .nest("/api", routes::api_routes());

    if let Some(dir) = public_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 구독자 허브 서버
pub struct WebServer {
    config: WebConfig,
    state: AppState,
}

impl WebServer {
    pub fn new(config: WebConfig, hub: Arc<Hub>, control: Arc<dyn SessionControl>) -> Self {
        Self {
            config,
            state: AppState { hub, control },
        }
    }

    /// 서버 실행
    ///
    /// 설정 포트부터 시작해 이미 사용 중이면 다음 포트를 시도한다 (최대 10개).
    /// 종료 신호를 받으면 진행 중인 연결을 정리하고 반환한다.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let host = if self.config.allow_external {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let app = router(self.state, self.config.public_dir.as_deref());

        let base_port = self.config.port;
        let mut last_error = None;

        for attempt in 0..MAX_PORT_ATTEMPTS {
            let port = base_port.saturating_add(attempt);
            if port < base_port && attempt > 0 {
                break;
            }

            let addr: SocketAddr = match format!("{host}:{port}").parse() {
                Ok(a) => a,
                Err(e) => {
                    error!("잘못된 주소 {host}:{port}: {e}");
                    continue;
                }
            };

            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    if attempt > 0 {
                        warn!("포트 {base_port} 사용 불가, 대체 포트 {port} 사용");
                    }
                    info!("서버 시작: http://{addr} (WebSocket: ws://{addr}/ws)");

                    axum::serve(listener, app)
                        .with_graceful_shutdown(async move {
                            loop {
                                if *shutdown_rx.borrow() {
                                    info!("웹 서버 종료 신호 수신");
                                    break;
                                }
                                if shutdown_rx.changed().await.is_err() {
                                    break;
                                }
                            }
                        })
                        .await?;

                    info!("웹 서버 종료");
                    return Ok(());
                }
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                    warn!("포트 {port} 이미 사용 중, 다음 포트 시도...");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                format!(
                    "포트 {}-{} 모두 사용 불가",
                    base_port,
                    base_port.saturating_add(MAX_PORT_ATTEMPTS - 1)
                ),
            )
        }))
    }

    /// 서버 URL 반환
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.config.port)
    }
}
