//! 공통 HTTP 처리: 클라이언트 생성, bearer 헤더, 에러 응답 분류.

use crate::{ClientError, ClientResult};
use reqwest::header::HeaderValue;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use signdesk_core::Credential;
use std::time::Duration;
use tracing::debug;

/// 타임아웃이 적용된 HTTP 클라이언트 생성.
pub(crate) fn build_client(timeout_secs: u64) -> ClientResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ClientError::Network(format!("HTTP client 생성 실패: {}", e)))
}

/// 기본 URL과 경로를 결합 (중복 슬래시 제거).
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// `Authorization: Bearer ...` 헤더 값 생성.
///
/// 비어 있거나 헤더에 쓸 수 없는 토큰은 요청 없이 `Unauthorized`.
pub(crate) fn bearer_header(token: &Credential) -> ClientResult<HeaderValue> {
    if token.is_blank() {
        return Err(ClientError::Unauthorized("missing bearer token".to_string()));
    }

    let mut value = HeaderValue::from_str(&token.bearer_header())
        .map_err(|_| ClientError::Unauthorized("malformed bearer token".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// 응답 상태와 본문 읽기.
pub(crate) async fn read_body(response: Response) -> ClientResult<(StatusCode, String)> {
    let status = response.status();
    let body = response.text().await?;
    debug!(status = status.as_u16(), bytes = body.len(), "Response received");
    Ok((status, body))
}

/// 호출 종류 (상태 코드 해석 방식이 다름).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallKind {
    /// 로그인
    Login,
    /// 회원가입
    Register,
    /// bearer 토큰이 필요한 호출
    Authenticated,
}

/// 백엔드 에러 본문: `{message: string | string[]}` 또는 `{error: string}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<MessageField>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageField {
    Text(String),
    List(Vec<String>),
}

/// 에러 본문에서 사용자용 메시지 추출.
pub(crate) fn extract_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;

    match parsed.message {
        Some(MessageField::Text(text)) if !text.trim().is_empty() => return Some(text),
        Some(MessageField::List(items)) if !items.is_empty() => return Some(items.join("; ")),
        _ => {}
    }

    match parsed.error {
        Some(serde_json::Value::String(text)) if !text.trim().is_empty() => Some(text),
        Some(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    }
}

/// 실패 상태 코드를 에러로 분류.
///
/// 호출 종류별로 의미가 정해진 코드 외의 4xx는 `Rejected`, 나머지는 `Server`.
pub(crate) fn error_for_status(kind: CallKind, status: StatusCode, body: &str) -> ClientError {
    let message = extract_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    match (kind, status.as_u16()) {
        (CallKind::Login, 400 | 401 | 403 | 404) => ClientError::InvalidCredentials(message),
        (CallKind::Register, 401) => ClientError::InvalidCredentials(message),
        (CallKind::Register, 400 | 409 | 422) => ClientError::Conflict(message),
        (CallKind::Authenticated, 401) => ClientError::Unauthorized(message),
        (CallKind::Authenticated, 403) => ClientError::Forbidden(message),
        (_, code @ 400..=499) => ClientError::Rejected {
            status: code,
            message,
        },
        (_, code) => ClientError::Server {
            status: code,
            message,
        },
    }
}
