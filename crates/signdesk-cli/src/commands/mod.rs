//! CLI 명령어 구현 모듈.

pub mod account;
pub mod documents;
pub mod status;
pub mod upload;

use anyhow::{Context, Result};
use signdesk_client::{ClientError, Session};
use signdesk_core::{AppConfig, FileCredentialStore, LogConfig, LogFormat, LoggingConfig};

/// 세션 파일 기반 세션 열기.
pub fn open_session(config: &AppConfig) -> Result<Session<FileCredentialStore>> {
    let store = FileCredentialStore::new(config.session.resolved_path());
    Session::from_config(&config.api, store).context("Failed to create API client")
}

/// 설정 파일의 로깅 설정에 명령줄 옵션을 덮어씁니다.
///
/// `verbose`면 레벨을 `debug`로 올립니다.
pub fn log_config(logging: &LoggingConfig, verbose: bool, format: Option<LogFormat>) -> LogConfig {
    let mut config = LogConfig::from(logging);
    if verbose {
        config = LogConfig::new("debug").with_format(config.format);
    }
    match format {
        Some(format) => config.with_format(format),
        None => config,
    }
}

/// 명령 실패 시 사용자에게 보여줄 안내.
///
/// 세션이 없거나 만료된 경우 다시 로그인하라는 안내를 덧붙입니다.
pub fn describe_failure(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ClientError>() {
        Some(client_err) if client_err.requires_logout() => format!(
            "{}\n👉 `signdesk login <email>`으로 다시 로그인하세요.",
            client_err.user_message()
        ),
        Some(client_err) => client_err.user_message(),
        None => format!("{:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_failure_adds_login_hint() {
        let err = anyhow::Error::new(ClientError::Unauthorized("expired".to_string()));
        let message = describe_failure(&err);
        assert!(message.contains("signdesk login"));

        let err = anyhow::Error::new(ClientError::Network("refused".to_string()));
        assert_eq!(describe_failure(&err), "Network error, please try again.");

        let err = anyhow::anyhow!("config broken");
        assert_eq!(describe_failure(&err), "config broken");
    }

    #[test]
    fn test_log_config_flags_override_file() {
        let logging = LoggingConfig {
            level: "warn".to_string(),
            format: "compact".to_string(),
        };

        let plain = log_config(&logging, false, None);
        assert_eq!(plain.level, "warn");
        assert_eq!(plain.format, LogFormat::Compact);

        let verbose = log_config(&logging, true, None);
        assert_eq!(verbose.level, "debug");
        assert_eq!(verbose.format, LogFormat::Compact);

        let json = log_config(&logging, false, Some(LogFormat::Json));
        assert_eq!(json.level, "warn");
        assert_eq!(json.format, LogFormat::Json);
    }
}
