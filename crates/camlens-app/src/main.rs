//! # camlens-app
//!
//! CAMLENS 서버 바이너리 진입점.
//! 설정 로드, 어댑터 조립, 캡처 컨트롤러와 웹 서버 실행, 종료 처리.

mod controller;
mod lifecycle;

use anyhow::{anyhow, Result};
use camlens_core::config::AppConfig;
use camlens_core::config_manager::ConfigManager;
use camlens_core::ports::camera::FrameSource;
use camlens_core::ports::inference::InferenceClient;
use camlens_core::ports::vision::FrameNormalizer;
use camlens_network::inference_client::HttpInferenceClient;
use camlens_storage::photo_store::PhotoStore;
use camlens_vision::capture::CommandFrameSource;
use camlens_vision::normalizer::JpegNormalizer;
use camlens_web::{Hub, WebServer};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::controller::{CaptureController, ControllerSettings};
use crate::lifecycle::{LifecycleManager, ShutdownReason};

/// CAMLENS 카메라 추론 데모 서버
///
/// USB 카메라 프레임을 주기적으로 비전 언어 모델에 보내고
/// 결과를 WebSocket 구독자에게 방송한다.
#[derive(Parser, Debug)]
#[command(name = "camlens")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 수신 포트 (설정 파일보다 우선)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// 추론 엔드포인트 URL (예: http://localhost:8000/llava)
    #[arg(long, short = 'e')]
    endpoint: Option<String>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 추론에 사용한 사진을 디스크에 남기지 않음
    #[arg(long)]
    no_persist: bool,
}

impl Args {
    /// CLI 값으로 설정 덮어쓰기
    fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.web.port = port;
        }
        if let Some(endpoint) = &self.endpoint {
            config.inference.endpoint = endpoint.clone();
        }
        if self.no_persist {
            config.storage.persist_photos = false;
        }
    }

    fn log_filter(&self) -> String {
        let level = &self.log_level;
        [
            "camlens",
            "camlens_app",
            "camlens_core",
            "camlens_vision",
            "camlens_network",
            "camlens_storage",
            "camlens_web",
            "tower_http",
        ]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
    }
}

async fn open_photo_store(config: &AppConfig) -> Option<PhotoStore> {
    if !config.storage.persist_photos {
        info!("사진 저장 비활성화");
        return None;
    }
    match PhotoStore::new(&config.storage.photos_dir).await {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("사진 저장소를 열 수 없음, 저장 없이 진행: {e}");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .init();

    let config_manager = match &args.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    if let Some(path) = config_manager.config_path() {
        debug!("설정 파일 경로: {}", path.display());
    }
    let mut config = config_manager.load()?;
    args.apply(&mut config);
    config.validate()?;

    info!(
        model = %config.inference.model,
        default_interval = ?config.default_interval(),
        "CAMLENS 시작"
    );

    // 어댑터 조립
    let source = Arc::new(CommandFrameSource::from_config(&config.capture)?);
    let normalizer: Arc<dyn FrameNormalizer> = Arc::new(JpegNormalizer::from_config(&config.vision));
    let inference = HttpInferenceClient::new(&config.inference)?;
    info!(endpoint = inference.endpoint(), "추론 엔드포인트");
    let inference: Arc<dyn InferenceClient> = Arc::new(inference);
    let photos = open_photo_store(&config).await;
    let hub = Arc::new(Hub::new(config.web.event_capacity));

    let controller = Arc::new(CaptureController::new(
        source.clone(),
        normalizer,
        inference,
        photos,
        hub.clone(),
        ControllerSettings::from_config(&config),
    ));

    if !source.is_available() {
        warn!(
            program = source.program(),
            "카메라 프로그램을 찾을 수 없음, 캡처 시작 요청은 거부됨"
        );
    } else if config.capture.self_test {
        debug!(temp_dir = %source.temp_dir().display(), "카메라 자체 테스트 예약");
        let source = source.clone();
        tokio::spawn(async move {
            if let Err(e) = source.self_test().await {
                warn!("카메라 자체 테스트 실패: {e}");
            }
        });
    }

    let lifecycle = LifecycleManager::new();
    let web_server = WebServer::new(config.web.clone(), hub, controller.clone());
    info!("웹 서버 주소: {}", web_server.url());
    let mut web_task = tokio::spawn(web_server.run(lifecycle.subscribe()));

    info!("CAMLENS 실행 중 (Ctrl+C로 종료)");
    let early_exit = tokio::select! {
        reason = lifecycle.wait_for_signal() => {
            info!(?reason, "종료 시그널 수신");
            None
        }
        result = &mut web_task => {
            lifecycle.shutdown(ShutdownReason::ServerStopped);
            Some(result)
        }
    };

    controller.shutdown().await;

    let web_result = match early_exit {
        Some(result) => result,
        None => web_task.await,
    };

    match web_result {
        Ok(Ok(())) => {
            info!("CAMLENS 종료");
            Ok(())
        }
        Ok(Err(e)) => {
            error!("웹 서버 오류: {e}");
            Err(anyhow!("웹 서버 실행 실패: {e}"))
        }
        Err(e) => Err(anyhow!("웹 서버 작업 실패: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let args = Args::try_parse_from([
            "camlens",
            "--port",
            "8080",
            "--endpoint",
            "http://10.0.0.5:8000/llava",
            "--no-persist",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.web.port, 8080);
        assert_eq!(config.inference.endpoint, "http://10.0.0.5:8000/llava");
        assert!(!config.storage.persist_photos);
    }

    #[test]
    fn no_flags_keep_config() {
        let args = Args::try_parse_from(["camlens"]).unwrap();
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.web.port, 3000);
        assert!(config.storage.persist_photos);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn log_filter_covers_workspace_crates() {
        let args = Args::try_parse_from(["camlens", "-l", "debug"]).unwrap();
        let filter = args.log_filter();
        assert!(filter.contains("camlens_app=debug"));
        assert!(filter.contains("camlens_web=debug"));
        assert!(filter.contains("tower_http=debug"));
    }

    #[test]
    fn invalid_port_rejected() {
        assert!(Args::try_parse_from(["camlens", "--port", "99999"]).is_err());
    }
}
