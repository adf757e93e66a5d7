//! SignDesk 코어 에러 타입.
//!
//! 세션 저장소는 에러 대신 "토큰 없음"으로 동작하므로, 코어에서 호출자에게
//! 전달되는 에러는 설정 로드 실패뿐입니다.

use thiserror::Error;

/// 코어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 코어 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}
