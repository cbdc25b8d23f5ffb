//! 프로세스 라이프사이클.
//!
//! OS 종료 시그널을 기다리고, watch 채널로 웹 서버 등 구독자에게 종료를 알린다.

use tokio::sync::watch;
use tracing::info;

/// 종료 원인
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// 웹 서버가 먼저 멈춤
    ServerStopped,
}

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx }
    }

    /// 종료 수신기
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// 구독자 전체에 종료 알림 (중복 호출 무시)
    pub fn shutdown(&self, reason: ShutdownReason) {
        if self.shutdown_tx.send_replace(true) {
            return;
        }
        info!(?reason, "종료 시작");
    }

    /// SIGINT/SIGTERM (non-unix는 Ctrl+C) 대기 후 종료 알림
    pub async fn wait_for_signal(&self) -> ShutdownReason {
        #[cfg(unix)]
        let reason = {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT 핸들러 등록 실패");
            let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM 핸들러 등록 실패");

            tokio::select! {
                _ = sigint.recv() => ShutdownReason::Interrupt,
                _ = sigterm.recv() => ShutdownReason::Terminate,
            }
        };

        #[cfg(not(unix))]
        let reason = {
            tokio::signal::ctrl_c()
                .await
                .expect("Ctrl+C 핸들러 등록 실패");
            ShutdownReason::Interrupt
        };

        self.shutdown(reason);
        reason
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
