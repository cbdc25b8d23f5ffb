//! 설정 로드.
//!
//! `config` crate로 세 단계를 겹쳐 읽는다:
//! serde 기본값 → 설정 파일(TOML/JSON, 선택) → `CAMLENS_*` 환경변수.
//! 환경변수는 `__`로 섹션을 구분한다 (예: `CAMLENS_WEB__PORT=8080`).

use crate::config::AppConfig;
use crate::error::CoreError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 설정 파일 이름
const CONFIG_FILE_NAME: &str = "config.toml";

/// 환경변수 접두사
const ENV_PREFIX: &str = "CAMLENS";

/// 설정 관리자
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 설정 파일 경로
    config_path: Option<PathBuf>,
    /// 명시적으로 지정된 파일인지 (없으면 에러)
    required: bool,
    /// 환경변수 접두사
    env_prefix: String,
}

impl ConfigManager {
    /// 플랫폼 기본 경로의 설정 파일을 사용 (파일이 없어도 됨)
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
            required: false,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// 지정된 설정 파일을 사용 (파일이 없으면 로드 실패)
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(config_path.into()),
            required: true,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// 환경변수 접두사 변경
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// 설정 파일 경로 반환
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// 설정 로드 + 검증
    pub fn load(&self) -> Result<AppConfig, CoreError> {
        let mut builder = config::Config::builder();

        if let Some(path) = &self.config_path {
            if path.exists() {
                info!("설정 파일 로드: {}", path.display());
            } else {
                debug!("설정 파일 없음, 기본값 사용: {}", path.display());
            }
            builder = builder.add_source(config::File::from(path.as_path()).required(self.required));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| CoreError::Config(format!("설정 소스 읽기 실패: {e}")))?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| CoreError::Config(format!("설정 파싱 실패: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// 플랫폼별 기본 설정 파일 경로
    ///
    /// - macOS: `~/Library/Application Support/io.camlens.camlens/config.toml`
    /// - Windows: `%APPDATA%\camlens\camlens\config\config.toml`
    /// - Linux: `~/.config/camlens/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "camlens", "camlens")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    #[test]
    fn load_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[web]\nport = 8088\n\n[inference]\nendpoint = \"http://10.0.0.5:8000/llava\"\n",
        )
        .unwrap();

        let config = ConfigManager::with_path(&path)
            .with_env_prefix("CAMLENS_TEST_TOML")
            .load()
            .unwrap();
        assert_eq!(config.web.port, 8088);
        assert_eq!(config.inference.endpoint, "http://10.0.0.5:8000/llava");
        // 파일에 없는 값은 기본값
        assert_eq!(config.vision.target_size, 672);
    }

    #[test]
    fn missing_required_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope.toml");
        let result = ConfigManager::with_path(path)
            .with_env_prefix("CAMLENS_TEST_MISSING")
            .load();
        assert_matches!(result, Err(CoreError::Config(_)));
    }

    #[test]
    fn env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[vision]\njpeg_quality = 60\n").unwrap();

        std::env::set_var("CAMLENS_TEST_ENV_VISION__JPEG_QUALITY", "90");
        std::env::set_var("CAMLENS_TEST_ENV_SESSION__DEFAULT_PROMPT", "Describe this");
        let config = ConfigManager::with_path(&path)
            .with_env_prefix("CAMLENS_TEST_ENV")
            .load()
            .unwrap();
        std::env::remove_var("CAMLENS_TEST_ENV_VISION__JPEG_QUALITY");
        std::env::remove_var("CAMLENS_TEST_ENV_SESSION__DEFAULT_PROMPT");

        assert_eq!(config.vision.jpeg_quality, 90);
        assert_eq!(config.session.default_prompt, "Describe this");
    }

    #[test]
    fn invalid_values_rejected_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[vision]\ntarget_size = 0\n").unwrap();

        let result = ConfigManager::with_path(&path)
            .with_env_prefix("CAMLENS_TEST_INVALID")
            .load();
        assert_matches!(result, Err(CoreError::Config(_)));
    }
}
