//! 카메라 캡처.
//!
//! 플랫폼별 외부 캡처 프로그램을 실행해 임시 파일에 정지 이미지를 쓰게 하고,
//! 그 파일을 읽어 원본 바이트로 돌려준다.
//!
//! | 플랫폼 | 프로그램 | 출력 |
//! |--------|----------|------|
//! | Linux  | fswebcam   | JPEG |
//! | macOS  | imagesnap  | JPEG |
//! | Windows| CommandCam | BMP  |
//!
//! 프로그램과 인자는 설정으로 바꿀 수 있다. 인자 안의 `{output}`, `{width}`,
//! `{height}`, `{device}`는 캡처마다 치환된다.

use async_trait::async_trait;
use camlens_core::config::CaptureConfig;
use camlens_core::error::CoreError;
use camlens_core::models::frame::RawCapture;
use camlens_core::ports::camera::FrameSource;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const OUTPUT_PLACEHOLDER: &str = "{output}";
const WIDTH_PLACEHOLDER: &str = "{width}";
const HEIGHT_PLACEHOLDER: &str = "{height}";
const DEVICE_PLACEHOLDER: &str = "{device}";

/// 플랫폼 기본 캡처 프로그램
pub fn default_program() -> &'static str {
    if cfg!(target_os = "macos") {
        "imagesnap"
    } else if cfg!(target_os = "windows") {
        "CommandCam"
    } else {
        "fswebcam"
    }
}

/// 플랫폼 기본 인자 템플릿
pub fn default_args(device: Option<&str>) -> Vec<String> {
    let mut args: Vec<&str> = Vec::new();
    if cfg!(target_os = "macos") {
        args.extend(["-q", "-w", "1"]);
        if device.is_some() {
            args.extend(["-d", DEVICE_PLACEHOLDER]);
        }
        args.push(OUTPUT_PLACEHOLDER);
    } else if cfg!(target_os = "windows") {
        args.extend(["/filename", OUTPUT_PLACEHOLDER, "/delay", "500"]);
        if device.is_some() {
            args.extend(["/devnum", DEVICE_PLACEHOLDER]);
        }
    } else {
        args.extend(["-q", "--no-banner", "-S", "2", "-r", "{width}x{height}"]);
        if device.is_some() {
            args.extend(["-d", DEVICE_PLACEHOLDER]);
        }
        args.extend(["--jpeg", "95", OUTPUT_PLACEHOLDER]);
    }
    args.into_iter().map(String::from).collect()
}

fn temp_extension() -> &'static str {
    if cfg!(target_os = "windows") {
        "bmp"
    } else {
        "jpg"
    }
}

/// 캡처 실패 원인 (프로그램 부재만 사용 가능 여부에 영향)
enum CaptureFailure {
    ProgramMissing(String),
    Failed(String),
}

impl From<CaptureFailure> for CoreError {
    fn from(failure: CaptureFailure) -> Self {
        match failure {
            CaptureFailure::ProgramMissing(msg) | CaptureFailure::Failed(msg) => {
                CoreError::Device(msg)
            }
        }
    }
}

/// 임시 캡처 파일.
///
/// 정상 경로에서는 [`TempCapture::remove`]로 비동기 삭제하고,
/// 캡처 future가 취소되어 거기까지 가지 못한 경우에만 드롭에서 삭제한다.
struct TempCapture {
    path: PathBuf,
    removed: bool,
}

impl TempCapture {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!("임시 캡처 파일 삭제: {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("임시 캡처 파일 삭제 실패 ({}): {e}", self.path.display()),
        }
    }
}

impl Drop for TempCapture {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("임시 캡처 파일 삭제: {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("임시 캡처 파일 삭제 실패 ({}): {e}", self.path.display()),
        }
    }
}

/// 외부 프로그램 기반 프레임 소스: `FrameSource` 포트 구현
pub struct CommandFrameSource {
    program: String,
    program_path: Option<PathBuf>,
    args: Vec<String>,
    device: Option<String>,
    width: u32,
    height: u32,
    temp_dir: PathBuf,
    available: AtomicBool,
    /// 장치는 한 번에 하나의 캡처만 처리
    capture_lock: Mutex<()>,
    sequence: AtomicU64,
}

impl CommandFrameSource {
    /// 설정에서 생성: 임시 디렉토리를 만들고 프로그램 위치를 확인한다
    pub fn from_config(config: &CaptureConfig) -> Result<Self, CoreError> {
        let program = config
            .program
            .clone()
            .unwrap_or_else(|| default_program().to_string());
        let args = config
            .args
            .clone()
            .unwrap_or_else(|| default_args(config.device.as_deref()));

        std::fs::create_dir_all(&config.temp_dir)?;

        let program_path = match which::which(&program) {
            Ok(path) => {
                info!("캡처 프로그램: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("캡처 프로그램을 찾을 수 없음 ({program}): {e}");
                None
            }
        };

        Ok(Self {
            program,
            available: AtomicBool::new(program_path.is_some()),
            program_path,
            args,
            device: config.device.clone(),
            width: config.width,
            height: config.height,
            temp_dir: config.temp_dir.clone(),
            capture_lock: Mutex::new(()),
            sequence: AtomicU64::new(0),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// 인자 템플릿 치환
    fn render_args(&self, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        let width = self.width.to_string();
        let height = self.height.to_string();
        let device = self.device.as_deref().unwrap_or_default();

        self.args
            .iter()
            .map(|arg| {
                arg.replace(OUTPUT_PLACEHOLDER, &output)
                    .replace(WIDTH_PLACEHOLDER, &width)
                    .replace(HEIGHT_PLACEHOLDER, &height)
                    .replace(DEVICE_PLACEHOLDER, device)
            })
            .collect()
    }

    fn next_temp_path(&self, prefix: &str) -> PathBuf {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.temp_dir.join(format!(
            "{prefix}_{}_{seq}.{}",
            Local::now().timestamp_millis(),
            temp_extension()
        ))
    }

    /// 프로그램 실행 → 임시 파일 읽기. 임시 파일은 모든 경로에서 삭제된다.
    async fn capture_bytes(&self, prefix: &str) -> Result<Vec<u8>, CaptureFailure> {
        let program_path = self.program_path.as_ref().ok_or_else(|| {
            CaptureFailure::ProgramMissing(format!("캡처 프로그램 없음: {}", self.program))
        })?;

        let _guard = self.capture_lock.lock().await;
        let temp = TempCapture::new(self.next_temp_path(prefix));

        let result = self.run_program(program_path, &temp.path).await;
        temp.remove().await;
        result
    }

    /// 프로그램 1회 실행 후 출력 파일 읽기
    async fn run_program(
        &self,
        program_path: &Path,
        output_path: &Path,
    ) -> Result<Vec<u8>, CaptureFailure> {
        let output = Command::new(program_path)
            .args(self.render_args(output_path))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                let msg = format!("캡처 프로그램 실행 실패 ({}): {e}", self.program);
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptureFailure::ProgramMissing(msg)
                } else {
                    CaptureFailure::Failed(msg)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptureFailure::Failed(format!(
                "캡처 프로그램 비정상 종료 ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(output_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CaptureFailure::Failed("캡처 파일이 생성되지 않음".to_string())
            } else {
                CaptureFailure::Failed(format!("캡처 파일 읽기 실패: {e}"))
            }
        })?;

        if bytes.is_empty() {
            return Err(CaptureFailure::Failed(
                "캡처 파일이 비어 있음 (0 bytes)".to_string(),
            ));
        }

        debug!("캡처 완료: {} bytes", bytes.len());
        Ok(bytes)
    }
}

#[async_trait]
impl FrameSource for CommandFrameSource {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    async fn capture(&self) -> Result<RawCapture, CoreError> {
        match self.capture_bytes("capture").await {
            Ok(bytes) => Ok(RawCapture::new(bytes)),
            Err(CaptureFailure::ProgramMissing(msg)) => {
                if self.available.swap(false, Ordering::AcqRel) {
                    warn!("카메라 사용 불가로 전환: {msg}");
                }
                Err(CoreError::Device(msg))
            }
            Err(failure) => Err(failure.into()),
        }
    }

    async fn self_test(&self) -> Result<(), CoreError> {
        match self.capture_bytes("test").await {
            Ok(bytes) => {
                info!("카메라 자가 테스트 성공: {} bytes", bytes.len());
                Ok(())
            }
            Err(failure) => {
                let err = CoreError::from(failure);
                warn!("카메라 자가 테스트 실패: {err}");
                Err(err)
            }
        }
    }

    async fn cleanup(&self) {
        let mut entries = match tokio::fs::read_dir(&self.temp_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!("임시 디렉토리 읽기 실패 ({}): {e}", self.temp_dir.display());
                return;
            }
        };

        let mut removed = 0usize;
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    if path.is_file() && tokio::fs::remove_file(&path).await.is_ok() {
                        removed += 1;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("임시 디렉토리 순회 실패: {e}");
                    break;
                }
            }
        }

        if removed > 0 {
            info!("임시 캡처 파일 {removed}개 정리");
        }
    }
}
