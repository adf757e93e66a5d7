//! 클라이언트 에러 타입.

use thiserror::Error;
use validator::ValidationErrors;

/// 백엔드/파일 호스팅 호출 관련 에러.
///
/// 실패한 작업은 기존 상태(자격증명, 신원, 문서 목록)를 바꾸지 않습니다.
/// 예외는 `Unauthorized`로, 세션 계층이 강제 로그아웃을 수행합니다.
#[derive(Debug, Error)]
pub enum ClientError {
    /// 네트워크 호출 전 로컬 검증 실패
    #[error("Validation error: {0}")]
    Validation(String),

    /// 로그인 자격증명 거부
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// 회원가입 거부 (중복 이메일 등)
    #[error("Registration rejected: {0}")]
    Conflict(String),

    /// 토큰 없음/형식 오류/서버 거부
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 역할상 허용되지 않는 작업
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 서버가 요청 자체를 거부 (분류되지 않은 4xx)
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// 서버 에러 (5xx 또는 예상치 못한 상태 코드)
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// 성공 응답 파싱 실패
    #[error("Parse error: {0}")]
    Parse(String),

    /// 파일 호스팅 업로드 실패
    #[error("Upload failed: {0}")]
    Upload(String),

    /// 자격증명 교환 요청이 이미 진행 중
    #[error("A credential exchange is already in progress")]
    ExchangeInFlight,
}

/// 클라이언트 작업을 위한 Result 타입.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// 사용자 조작으로 재시도할 수 있는 에러인지 확인.
    ///
    /// 어떤 에러도 자동으로 재시도하지 않습니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout(_))
    }

    /// 강제 로그아웃이 필요한 에러인지 확인.
    pub fn requires_logout(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// 사용자에게 보여줄 메시지.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            ClientError::InvalidCredentials(msg) => format!("Login failed: {}", msg),
            ClientError::Conflict(msg) => format!("Registration failed: {}", msg),
            ClientError::Unauthorized(_) => {
                "Your session is missing or has expired. Please log in again.".to_string()
            }
            ClientError::Forbidden(msg) => format!("Permission denied: {}", msg),
            ClientError::Rejected { message, .. } => format!("Request rejected: {}", message),
            ClientError::Network(_) | ClientError::Timeout(_) => {
                "Network error, please try again.".to_string()
            }
            ClientError::Server { .. } | ClientError::Parse(_) => {
                "The server could not complete the request. Please try again later.".to_string()
            }
            ClientError::Upload(msg) => format!("Upload failed: {}", msg),
            ClientError::ExchangeInFlight => {
                "A request is already in progress, please wait.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}

/// 필드 검증 에러를 사람이 읽을 수 있는 한 줄로 합칩니다.
impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        ClientError::Validation(messages.join("; "))
    }
}
