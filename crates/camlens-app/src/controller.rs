//! 캡처 세션 컨트롤러.
//!
//! 세션 상태와 응답 기록을 소유하고, 주기 타이머로
//! 캡처 → 정규화 → 크기 검사 → 저장 → 추론 → 발행 파이프라인을 돌린다.
//!
//! 타이머는 `CancellationToken` + `JoinHandle` 한 쌍으로 보관한다.
//! 중지는 토큰을 취소한 뒤 작업 종료를 기다리므로,
//! 진행 중이던 실행은 끝까지 발행을 마친 뒤 중지 상태가 방송된다.
//! 프로세스 종료 시에는 [`SHUTDOWN_GRACE`]까지만 기다리고 남은 실행을 중단한다.

use async_trait::async_trait;
use camlens_core::config::AppConfig;
use camlens_core::error::CoreError;
use camlens_core::models::frame::NormalizedFrame;
use camlens_core::models::response::{ResponseEntry, ResponseHistory};
use camlens_core::models::session::{CaptureSession, SessionCommand, SessionSnapshot};
use camlens_core::ports::camera::FrameSource;
use camlens_core::ports::inference::InferenceClient;
use camlens_core::ports::session::SessionControl;
use camlens_core::ports::vision::FrameNormalizer;
use camlens_storage::photo_store::PhotoStore;
use camlens_web::{Hub, HubEvent};
use chrono::Local;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 응답 기록 시각 표시 형식
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 종료 시 진행 중인 실행을 기다리는 최대 시간
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// 컨트롤러 기본값
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub default_interval_secs: u64,
    pub default_prompt: String,
    pub max_base64_bytes: usize,
    pub history_limit: usize,
}

impl ControllerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            default_interval_secs: config.session.default_interval_secs.max(1),
            default_prompt: config.session.default_prompt.clone(),
            max_base64_bytes: config.vision.max_base64_bytes,
            history_limit: config.session.history_limit,
        }
    }
}

/// 실행 중인 타이머 핸들
struct Ticker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// 타이머 작업과 공유하는 파이프라인 상태
struct Pipeline {
    source: Arc<dyn FrameSource>,
    normalizer: Arc<dyn FrameNormalizer>,
    inference: Arc<dyn InferenceClient>,
    photos: Option<PhotoStore>,
    hub: Arc<Hub>,
    session: Mutex<CaptureSession>,
    history: Mutex<ResponseHistory>,
    max_base64_bytes: usize,
    /// 사용 불가 상태를 이미 알렸는지 (다시 사용 가능해지면 초기화)
    unavailable_reported: AtomicBool,
}

impl Pipeline {
    fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot(self.hub.connected_count())
    }

    fn publish_state(&self) {
        self.hub.publish(HubEvent::StateUpdate(self.snapshot()));
    }

    /// 1회 실행: 실패는 error 이벤트로만 알리고 타이머는 계속된다.
    /// 카메라가 사용 불가로 바뀐 뒤에는 캡처를 시도하지 않고 한 번만 알린다.
    async fn run_once(&self) {
        if !self.source.is_available() {
            if self.unavailable_reported.swap(true, Ordering::AcqRel) {
                debug!("카메라 사용 불가, 실행 생략");
            } else {
                let err = CoreError::Device("카메라를 사용할 수 없음. 연결을 확인하세요".into());
                warn!("{err}");
                self.hub.publish(HubEvent::Error(err.to_string()));
            }
            return;
        }
        self.unavailable_reported.store(false, Ordering::Release);

        if let Err(e) = self.process_frame().await {
            error!("캡처 처리 실패: {e}");
            if !self.source.is_available() {
                self.unavailable_reported.store(true, Ordering::Release);
            }
            self.hub.publish(HubEvent::Error(e.to_string()));
        }
    }

    async fn process_frame(&self) -> Result<(), CoreError> {
        debug!("카메라 캡처 시작");
        let raw = self.source.capture().await?;
        let frame = self.normalizer.normalize(raw).await?;

        let size = frame.base64_len();
        if size > self.max_base64_bytes {
            warn!(size, limit = self.max_base64_bytes, "프레임이 너무 커서 전송 생략");
            self.hub.publish(HubEvent::LiveImage(None));
            return Err(CoreError::SizeLimitExceeded {
                size,
                limit: self.max_base64_bytes,
            });
        }

        self.hub.publish(HubEvent::LiveImage(Some(frame.base64.clone())));

        let file_name = frame.file_name();
        let file_path = self.persist(&frame).await;
        let prompt = self.session.lock().prompt.clone();

        let response = self.inference.infer(&frame, &prompt, &file_name).await;

        let (entry, history) = {
            let mut history = self.history.lock();
            let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
            let entry = history.push(timestamp, file_name, file_path, &prompt, response);
            (entry, history.snapshot())
        };

        info!(id = entry.id, file = %entry.file_name, "응답 기록 추가");
        self.hub.publish(HubEvent::NewResponse(entry));
        self.hub.publish(HubEvent::ResponsesHistory(history));
        Ok(())
    }

    async fn persist(&self, frame: &NormalizedFrame) -> Option<String> {
        let store = self.photos.as_ref()?;
        match store.save(frame).await {
            Ok(path) => Some(path.display().to_string()),
            Err(e) => {
                warn!("사진 저장 실패, 경로 없이 계속: {e}");
                None
            }
        }
    }
}

/// 주기 실행 루프: 첫 tick은 즉시.
///
/// `cancel`은 tick 사이에서만 확인하고, `halt`는 진행 중인 실행도 중단한다.
async fn run_ticker(
    pipeline: Arc<Pipeline>,
    period: Duration,
    cancel: CancellationToken,
    halt: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                tokio::select! {
                    _ = pipeline.run_once() => {}
                    _ = halt.cancelled() => {
                        warn!("진행 중인 캡처 실행 중단");
                        break;
                    }
                }
            }
        }
    }
    debug!("캡처 타이머 종료");
}

/// 캡처 세션 컨트롤러
pub struct CaptureController {
    pipeline: Arc<Pipeline>,
    ticker: tokio::sync::Mutex<Option<Ticker>>,
    /// 종료 시 진행 중인 실행까지 끊는 토큰
    halt: CancellationToken,
    settings: ControllerSettings,
}

impl CaptureController {
    pub fn new(
        source: Arc<dyn FrameSource>,
        normalizer: Arc<dyn FrameNormalizer>,
        inference: Arc<dyn InferenceClient>,
        photos: Option<PhotoStore>,
        hub: Arc<Hub>,
        settings: ControllerSettings,
    ) -> Self {
        let pipeline = Pipeline {
            source,
            normalizer,
            inference,
            photos,
            hub,
            session: Mutex::new(CaptureSession::new(
                settings.default_interval_secs,
                settings.default_prompt.clone(),
            )),
            history: Mutex::new(ResponseHistory::new(settings.history_limit)),
            max_base64_bytes: settings.max_base64_bytes,
            unavailable_reported: AtomicBool::new(false),
        };

        Self {
            pipeline: Arc::new(pipeline),
            ticker: tokio::sync::Mutex::new(None),
            halt: CancellationToken::new(),
            settings,
        }
    }

    /// 주기 캡처 시작 (이미 캡처 중이면 상태만 재방송)
    pub async fn start(
        &self,
        seconds: Option<u64>,
        prompt: Option<String>,
    ) -> Result<(), CoreError> {
        let mut slot = self.ticker.lock().await;
        if slot.is_some() {
            debug!("이미 캡처 중, 시작 명령 무시");
            self.pipeline.publish_state();
            return Ok(());
        }

        if !self.pipeline.source.is_available() {
            return Err(CoreError::Device(
                "카메라를 사용할 수 없음. 연결을 확인하세요".into(),
            ));
        }

        let interval_secs = seconds
            .filter(|s| *s > 0)
            .unwrap_or(self.settings.default_interval_secs);
        let prompt = prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.settings.default_prompt.clone());

        {
            let mut session = self.pipeline.session.lock();
            session.is_capturing = true;
            session.interval_seconds = interval_secs;
            session.prompt = prompt;
        }
        info!(interval_secs, "주기 캡처 시작");
        self.pipeline.publish_state();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_ticker(
            self.pipeline.clone(),
            Duration::from_secs(interval_secs),
            cancel.clone(),
            self.halt.clone(),
        ));
        *slot = Some(Ticker { cancel, handle });
        Ok(())
    }

    /// 주기 캡처 중지: 진행 중인 실행이 끝난 뒤 상태 방송
    pub async fn stop(&self) {
        let mut slot = self.ticker.lock().await;
        match slot.take() {
            Some(ticker) => {
                self.pipeline.session.lock().is_capturing = false;
                ticker.cancel.cancel();
                if let Err(e) = ticker.handle.await {
                    error!("캡처 타이머 작업 비정상 종료: {e}");
                }
                info!("주기 캡처 중지");
            }
            None => debug!("캡처 중이 아님, 중지 명령 무시"),
        }
        drop(slot);
        self.pipeline.publish_state();
    }

    /// 프롬프트 변경 (다음 실행부터 적용)
    pub fn update_prompt(&self, prompt: String) {
        info!(chars = prompt.chars().count(), "프롬프트 변경");
        self.pipeline.session.lock().prompt = prompt;
        self.pipeline.publish_state();
    }

    pub fn clear_history(&self) {
        self.pipeline.history.lock().clear();
        info!("응답 기록 삭제");
        self.pipeline
            .hub
            .publish(HubEvent::ResponsesHistory(Vec::new()));
        self.pipeline.publish_state();
    }

    /// 타이머 중지 + 임시 파일 정리.
    ///
    /// 진행 중인 실행은 [`SHUTDOWN_GRACE`]까지 기다린 뒤 중단한다.
    pub async fn shutdown(&self) {
        let stop = self.stop();
        tokio::pin!(stop);
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut stop).await.is_err() {
            warn!(grace = ?SHUTDOWN_GRACE, "진행 중인 실행이 끝나지 않아 강제 중단");
            self.halt.cancel();
            stop.await;
        }
        self.pipeline.source.cleanup().await;
    }
}

#[async_trait]
impl SessionControl for CaptureController {
    fn snapshot(&self) -> SessionSnapshot {
        self.pipeline.snapshot()
    }

    fn history(&self) -> Vec<ResponseEntry> {
        self.pipeline.history.lock().snapshot()
    }

    async fn execute(&self, command: SessionCommand) -> Result<(), CoreError> {
        match command {
            SessionCommand::StartCapture { seconds, prompt } => self.start(seconds, prompt).await,
            SessionCommand::StopCapture => {
                self.stop().await;
                Ok(())
            }
            SessionCommand::UpdatePrompt(prompt) => {
                self.update_prompt(prompt);
                Ok(())
            }
            SessionCommand::ClearHistory => {
                self.clear_history();
                Ok(())
            }
        }
    }

    async fn preview(&self) -> Result<NormalizedFrame, CoreError> {
        if !self.pipeline.source.is_available() {
            return Err(CoreError::Device("카메라를 사용할 수 없음".into()));
        }
        let raw = self.pipeline.source.capture().await?;
        self.pipeline.normalizer.normalize_preview(raw).await
    }
}
