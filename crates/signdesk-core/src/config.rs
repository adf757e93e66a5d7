//! 설정 관리.
//!
//! 기본값 → TOML 파일 → `SIGNDESK__` 환경 변수 순서로 덮어씁니다.

use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 환경 변수 접두사.
pub const ENV_PREFIX: &str = "SIGNDESK";

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 백엔드 API 설정
    #[serde(default)]
    pub api: ApiConfig,
    /// 파일 호스팅 업로드 설정
    #[serde(default)]
    pub upload: UploadConfig,
    /// 세션 저장 설정
    #[serde(default)]
    pub session: SessionConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 백엔드 API 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

fn default_api_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            timeout_secs: default_api_timeout(),
        }
    }
}

/// 파일 호스팅(Cloudinary 호환) 업로드 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// 업로드 API 기본 URL
    pub base_url: String,
    /// 클라우드 이름
    #[serde(default)]
    pub cloud_name: String,
    /// 서명 없는 업로드 프리셋
    #[serde(default)]
    pub upload_preset: String,
    /// 업로드 타임아웃 (초)
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
}

fn default_upload_timeout() -> u64 {
    120
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cloudinary.com".to_string(),
            cloud_name: String::new(),
            upload_preset: String::new(),
            timeout_secs: default_upload_timeout(),
        }
    }
}

impl UploadConfig {
    /// 업로드에 필요한 값이 모두 설정되었는지 확인.
    pub fn is_configured(&self) -> bool {
        !self.cloud_name.trim().is_empty() && !self.upload_preset.trim().is_empty()
    }
}

/// 세션 저장 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    /// 세션 파일 경로 (없으면 `$HOME/.signdesk/session.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl SessionConfig {
    /// 실제 세션 파일 경로 반환.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }

        let base = std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join(".signdesk").join("session.json")
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:3001");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(!config.upload.is_configured());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "https://sign.example.com"

[upload]
base_url = "https://api.cloudinary.com"
cloud_name = "demo"
upload_preset = "unsigned_pdf"

[session]
path = "/tmp/signdesk-test/session.json"
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://sign.example.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.upload.is_configured());
        assert_eq!(
            config.session.resolved_path(),
            PathBuf::from("/tmp/signdesk-test/session.json")
        );
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.api.base_url, ApiConfig::default().base_url);
    }

    #[test]
    fn test_session_path_default_ends_with_session_file() {
        let path = SessionConfig::default().resolved_path();
        assert!(path.ends_with(".signdesk/session.json"));
    }
}
