//! 인증 게이트웨이.
//!
//! 처리 기능:
//! - 로그인: 이메일/비밀번호 → 토큰 (POST /auth/login)
//! - 회원가입: 이메일/비밀번호/역할 → 토큰 (POST /auth/register)
//! - 신원 확인: 토큰 → 신원 (GET /me)
//!
//! 상태를 갖지 않으며 토큰 내용을 로컬에서 해석하지 않습니다.
//! 신원은 항상 서버의 `/me` 응답으로만 결정됩니다.

use crate::http::{self, CallKind};
use crate::{ClientError, ClientResult};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use signdesk_core::{ApiConfig, Credential, Identity, Role};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// 자격증명 교환 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    /// 새로 발급된 토큰
    pub token: Credential,
    /// 응답에 포함된 신원 스냅샷 (있을 경우)
    pub identity: Option<Identity>,
}

#[derive(Serialize, Validate)]
struct LoginRequest {
    #[validate(email(message = "a valid email address is required"))]
    email: String,
    #[validate(length(min = 1, message = "password is required"))]
    password: String,
}

#[derive(Serialize, Validate)]
struct RegisterRequest {
    #[validate(email(message = "a valid email address is required"))]
    email: String,
    #[validate(length(min = 1, message = "password is required"))]
    password: String,
    role: Role,
}

/// 백엔드 인증 응답 원본.
///
/// 토큰 필드 이름이 `token`/`access_token`으로 섞여 오고 `user`는 선택입니다.
#[derive(Debug, Deserialize)]
struct RawAuthResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, alias = "accessToken")]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<serde_json::Value>,
}

impl RawAuthResponse {
    fn normalize(self, status: StatusCode) -> ClientResult<AuthGrant> {
        let token = self
            .access_token
            .or(self.token)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ClientError::Server {
                status: status.as_u16(),
                message: "auth response did not include a token".to_string(),
            })?;

        let identity = self.user.and_then(|user| match serde_json::from_value::<Identity>(user) {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!(error = %e, "Ignoring unusable user snapshot in auth response");
                None
            }
        });

        Ok(AuthGrant {
            token: Credential::new(token),
            identity,
        })
    }
}

/// `/me` 응답: 신원 그대로 또는 `{user: {...}}`로 감싼 형태.
#[derive(Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: Identity },
    Bare(Identity),
}

impl From<MeResponse> for Identity {
    fn from(response: MeResponse) -> Self {
        match response {
            MeResponse::Wrapped { user } => user,
            MeResponse::Bare(identity) => identity,
        }
    }
}

/// 인증 게이트웨이.
#[derive(Debug, Clone)]
pub struct AuthGateway {
    client: Client,
    base_url: String,
}

impl AuthGateway {
    /// API 설정으로 게이트웨이 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ClientError::Network`를 반환합니다.
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        Ok(Self::with_client(
            http::build_client(config.timeout_secs)?,
            config.base_url.clone(),
        ))
    }

    /// 기존 HTTP 클라이언트로 게이트웨이 생성.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// 이메일/비밀번호를 토큰으로 교환.
    ///
    /// # Errors
    /// - `Validation`: 이메일 형식 오류 또는 빈 비밀번호 (요청 전)
    /// - `InvalidCredentials`: 서버가 로그인을 거부
    /// - `Network`/`Timeout`: 전송 실패
    #[instrument(skip(self, password))]
    pub async fn exchange_credentials(&self, email: &str, password: &str) -> ClientResult<AuthGrant> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        let grant = self.post_auth("/auth/login", &request, CallKind::Login).await?;
        info!("Credential exchange succeeded");
        Ok(grant)
    }

    /// 계정을 등록하고 토큰을 발급받음.
    ///
    /// 역할은 요청 전에 `UPLOADER`/`SIGNER` 중 하나인지 검사합니다.
    ///
    /// # Errors
    /// - `Validation`: 역할 누락/알 수 없는 역할, 이메일/비밀번호 오류 (요청 전)
    /// - `Conflict`: 서버가 등록을 거부 (400/409)
    #[instrument(skip(self, password))]
    pub async fn register_account(
        &self,
        email: &str,
        password: &str,
        role: &str,
    ) -> ClientResult<AuthGrant> {
        if role.trim().is_empty() {
            return Err(ClientError::Validation("role is required".to_string()));
        }
        let role = Role::parse(role).ok_or_else(|| {
            ClientError::Validation(format!(
                "unknown role '{}': expected UPLOADER or SIGNER",
                role.trim()
            ))
        })?;

        let request = RegisterRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            role,
        };
        request.validate()?;

        let grant = self
            .post_auth("/auth/register", &request, CallKind::Register)
            .await?;
        info!(role = %role, "Account registered");
        Ok(grant)
    }

    /// 토큰으로 서버에 신원을 조회.
    ///
    /// # Errors
    /// 토큰이 비었거나 형식이 잘못되었거나 서버가 거부하면 `Unauthorized`.
    #[instrument(skip_all)]
    pub async fn resolve_identity(&self, token: &Credential) -> ClientResult<Identity> {
        let authorization = http::bearer_header(token)?;
        let url = http::join_url(&self.base_url, "/me");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        let (status, body) = http::read_body(response).await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "Identity lookup rejected");
            return Err(http::error_for_status(CallKind::Authenticated, status, &body));
        }

        let me: MeResponse = serde_json::from_str(&body).map_err(|e| {
            ClientError::Parse(format!("Failed to parse identity response: {}", e))
        })?;
        let identity = Identity::from(me);
        debug!(user_id = identity.id, role = %identity.role, "Identity resolved");
        Ok(identity)
    }

    async fn post_auth<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        kind: CallKind,
    ) -> ClientResult<AuthGrant> {
        let url = http::join_url(&self.base_url, path);

        let response = self.client.post(&url).json(body).send().await?;
        let (status, text) = http::read_body(response).await?;

        if !status.is_success() {
            let err = http::error_for_status(kind, status, &text);
            warn!(status = status.as_u16(), error = %err, "Credential exchange failed");
            return Err(err);
        }

        let raw: RawAuthResponse = serde_json::from_str(&text)
            .map_err(|e| ClientError::Parse(format!("Failed to parse auth response: {}", e)))?;
        raw.normalize(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn gateway(server: &mockito::Server) -> AuthGateway {
        AuthGateway::new(&ApiConfig {
            base_url: server.url(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_normalize_access_token_and_user() {
        let raw: RawAuthResponse = serde_json::from_str(
            r#"{"access_token":"tok","user":{"id":1,"email":"a@x.com","role":"UPLOADER"}}"#,
        )
        .unwrap();
        let grant = raw.normalize(StatusCode::OK).unwrap();
        assert_eq!(grant.token.expose(), "tok");
        assert_eq!(grant.identity, Some(Identity::new(1, "a@x.com", Role::Uploader)));
    }

    #[test]
    fn test_normalize_token_field_and_broken_user() {
        let raw: RawAuthResponse =
            serde_json::from_str(r#"{"token":"tok2","user":{"name":"no id"}}"#).unwrap();
        let grant = raw.normalize(StatusCode::OK).unwrap();
        assert_eq!(grant.token.expose(), "tok2");
        assert!(grant.identity.is_none());
    }

    #[test]
    fn test_normalize_without_token_fails() {
        let raw: RawAuthResponse = serde_json::from_str(r#"{"user":null}"#).unwrap();
        assert!(matches!(
            raw.normalize(StatusCode::OK),
            Err(ClientError::Server { status: 200, .. })
        ));
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/login")
            .match_body(Matcher::Json(json!({"email": "a@x.com", "password": "p"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"jwt-abc"}"#)
            .create_async()
            .await;

        let grant = gateway(&server)
            .exchange_credentials("a@x.com", "p")
            .await
            .unwrap();

        assert_eq!(grant.token.expose(), "jwt-abc");
        assert!(grant.identity.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"message":"Invalid credentials"}"#)
            .create_async()
            .await;

        let err = gateway(&server)
            .exchange_credentials("a@x.com", "wrong")
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::InvalidCredentials(ref m) if m == "Invalid credentials"));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_login_invalid_email_never_hits_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/login")
            .expect(0)
            .create_async()
            .await;

        let err = gateway(&server)
            .exchange_credentials("not-an-email", "p")
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_register_missing_role_never_hits_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/register")
            .expect(0)
            .create_async()
            .await;
        let gateway = gateway(&server);

        let err = gateway
            .register_account("a@x.com", "p", "")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref m) if m == "role is required"));

        let err = gateway
            .register_account("a@x.com", "p", "ADMIN")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_register_sends_canonical_role() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/register")
            .match_body(Matcher::Json(
                json!({"email": "s@x.com", "password": "pw", "role": "SIGNER"}),
            ))
            .with_status(201)
            .with_body(r#"{"token":"t1","user":{"id":"9","email":"s@x.com","role":"SIGNER"}}"#)
            .create_async()
            .await;

        let grant = gateway(&server)
            .register_account("s@x.com", "pw", "signer")
            .await
            .unwrap();

        assert_eq!(grant.token.expose(), "t1");
        assert_eq!(grant.identity, Some(Identity::new(9, "s@x.com", Role::Signer)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_register_conflict() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/register")
            .with_status(409)
            .with_body(r#"{"message":"Email already in use"}"#)
            .create_async()
            .await;

        let err = gateway(&server)
            .register_account("a@x.com", "p", "UPLOADER")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Conflict(ref m) if m == "Email already in use"));
    }

    #[tokio::test]
    async fn test_resolve_identity_bare_and_wrapped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/me")
            .match_header("authorization", "Bearer bare-token")
            .with_status(200)
            .with_body(r#"{"id":1,"email":"a@x.com","role":"UPLOADER"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/me")
            .match_header("authorization", "Bearer wrapped-token")
            .with_status(200)
            .with_body(r#"{"user":{"sub":"2","email":"s@x.com","role":"SIGNER"}}"#)
            .create_async()
            .await;
        let gateway = gateway(&server);

        let bare = gateway
            .resolve_identity(&Credential::new("bare-token"))
            .await
            .unwrap();
        assert_eq!(bare, Identity::new(1, "a@x.com", Role::Uploader));

        let wrapped = gateway
            .resolve_identity(&Credential::new("wrapped-token"))
            .await
            .unwrap();
        assert_eq!(wrapped, Identity::new(2, "s@x.com", Role::Signer));
    }

    #[tokio::test]
    async fn test_resolve_identity_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/me")
            .with_status(401)
            .with_body(r#"{"error":"Invalid token"}"#)
            .create_async()
            .await;

        let err = gateway(&server)
            .resolve_identity(&Credential::new("garbage-token"))
            .await
            .unwrap_err();
        assert!(err.requires_logout());
    }

    #[tokio::test]
    async fn test_resolve_identity_blank_token_never_hits_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/me").expect(0).create_async().await;

        let err = gateway(&server)
            .resolve_identity(&Credential::new(" "))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_network_error_is_retryable() {
        // 닫힌 포트로 연결 시도
        let gateway = AuthGateway::new(&ApiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
        })
        .unwrap();

        let err = gateway
            .exchange_credentials("a@x.com", "p")
            .await
            .unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {:?}", err);
    }
}
