//! 세션 코디네이터.
//!
//! 자격증명 저장소, 인증 게이트웨이, 역할 라우터를 순서대로 엮습니다.
//!
//! - 자격증명 교환은 한 번에 하나만 진행됩니다.
//! - 교환이 성공하면 토큰을 저장한 뒤에 반환하므로, 이후 호출은 항상 새 토큰을 봅니다.
//! - `Unauthorized`는 사용한 토큰이 여전히 현재 토큰일 때만 저장소를 비웁니다.
//! - 반환된 future를 drop하면 요청이 취소되고 저장소는 바뀌지 않습니다.

use crate::auth::{AuthGateway, AuthGrant};
use crate::documents::DocumentService;
use crate::upload::{FileHost, UploadOutcome, UploadRequest};
use crate::{ClientError, ClientResult};
use chrono::{DateTime, Utc};
use signdesk_core::{
    route, Action, ApiConfig, Credential, CredentialStore, Document, DocumentEndpoint, Identity,
    NewDocument, RouteDecision,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// 네트워크 호출 없이 확인한 세션 상태.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub logged_in: bool,
    /// 표시용 신원 (권한 판단에 사용 금지)
    pub cached_identity: Option<Identity>,
    pub saved_at: Option<DateTime<Utc>>,
}

/// 문서 목록 조회 결과.
///
/// 실패해도 `Err` 대신 빈 목록과 에러를 함께 돌려줍니다.
#[derive(Debug)]
pub struct DocumentListing {
    pub documents: Vec<Document>,
    pub endpoint: DocumentEndpoint,
    pub error: Option<ClientError>,
}

impl DocumentListing {
    fn failed(endpoint: DocumentEndpoint, error: ClientError) -> Self {
        Self {
            documents: Vec::new(),
            endpoint,
            error: Some(error),
        }
    }

    /// 조회 성공 여부.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 세션 코디네이터.
pub struct Session<S: CredentialStore> {
    gateway: AuthGateway,
    documents: DocumentService,
    store: S,
    exchange_guard: Mutex<()>,
}

impl<S: CredentialStore> Session<S> {
    /// 구성 요소로 세션 생성.
    pub fn new(gateway: AuthGateway, documents: DocumentService, store: S) -> Self {
        Self {
            gateway,
            documents,
            store,
            exchange_guard: Mutex::new(()),
        }
    }

    /// API 설정으로 세션 생성.
    pub fn from_config(config: &ApiConfig, store: S) -> ClientResult<Self> {
        Ok(Self::new(
            AuthGateway::new(config)?,
            DocumentService::new(config)?,
            store,
        ))
    }

    /// 자격증명 저장소.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 로그인.
    ///
    /// 성공 시 토큰을 저장하고 (응답에 있으면) 신원 스냅샷을 캐시합니다.
    /// 실패 시 저장소는 그대로입니다.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<AuthGrant> {
        let _guard = self.begin_exchange()?;
        let grant = self.gateway.exchange_credentials(email, password).await?;
        self.persist(&grant);
        Ok(grant)
    }

    /// 회원가입.
    pub async fn register(&self, email: &str, password: &str, role: &str) -> ClientResult<AuthGrant> {
        let _guard = self.begin_exchange()?;
        let grant = self.gateway.register_account(email, password, role).await?;
        self.persist(&grant);
        Ok(grant)
    }

    /// 로그아웃. 멱등입니다.
    pub fn logout(&self) {
        self.store.clear();
        info!("Logged out");
    }

    /// 로컬 세션 상태.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            logged_in: self.store.is_logged_in(),
            cached_identity: self.store.cached_identity(),
            saved_at: self.store.saved_at(),
        }
    }

    /// 서버에서 현재 신원을 확인.
    ///
    /// # Errors
    /// 토큰이 없으면 요청 없이 `Unauthorized`. 서버가 토큰을 거부하면 저장소를 비우고
    /// `Unauthorized`를 반환합니다.
    pub async fn current_identity(&self) -> ClientResult<Identity> {
        let token = self.require_token()?;
        self.resolve_with(&token).await
    }

    /// 서버에서 확인한 신원의 라우팅 결정. 실패하면 권한 없음.
    pub async fn route(&self) -> RouteDecision {
        match self.current_identity().await {
            Ok(identity) => route(Some(&identity)),
            Err(e) => {
                debug!(error = %e, "No verified identity, routing to no access");
                route(None)
            }
        }
    }

    /// 역할에 맞는 문서 목록 조회.
    #[instrument(skip(self))]
    pub async fn list_documents(&self) -> DocumentListing {
        let token = match self.require_token() {
            Ok(token) => token,
            Err(e) => return DocumentListing::failed(DocumentEndpoint::None, e),
        };

        let identity = match self.resolve_with(&token).await {
            Ok(identity) => identity,
            Err(e) => return DocumentListing::failed(DocumentEndpoint::None, e),
        };

        let endpoint = route(Some(&identity)).document_endpoint;
        match self.documents.list(&token, endpoint).await {
            Ok(documents) => DocumentListing {
                documents,
                endpoint,
                error: None,
            },
            Err(e) => {
                self.handle_failure(&token, &e);
                DocumentListing::failed(endpoint, e)
            }
        }
    }

    /// PDF를 업로드하고 서명자를 지정.
    ///
    /// 로컬 검증 → 서버 신원 확인 → 권한 확인 → 파일 업로드 → 문서 생성 순서입니다.
    /// 백엔드에는 바이너리가 아닌 URL만 전달합니다.
    #[instrument(skip(self, host, request), fields(host = host.name()))]
    pub async fn upload_and_assign(
        &self,
        host: &dyn FileHost,
        request: UploadRequest,
    ) -> ClientResult<UploadOutcome> {
        request.check()?;

        let token = self.require_token()?;
        let identity = self.resolve_with(&token).await?;
        let decision = route(Some(&identity));
        if !(decision.permits(Action::Upload) && decision.permits(Action::Assign)) {
            warn!(role = %identity.role, "Upload attempted without permission");
            return Err(ClientError::Forbidden(format!(
                "role {} cannot upload or assign documents",
                identity.role
            )));
        }

        let file_url = host.upload_pdf(&request.file).await?;

        let new_document = NewDocument {
            title: request.title,
            description: request.description,
            original_url: file_url.clone(),
            assigned_to_email: request.signer_email,
        };
        let document = self
            .documents
            .create_document(&token, &new_document)
            .await
            .inspect_err(|e| self.handle_failure(&token, e))?;

        Ok(UploadOutcome { file_url, document })
    }

    fn begin_exchange(&self) -> ClientResult<tokio::sync::MutexGuard<'_, ()>> {
        self.exchange_guard.try_lock().map_err(|_| {
            debug!("Credential exchange already in flight");
            ClientError::ExchangeInFlight
        })
    }

    fn persist(&self, grant: &AuthGrant) {
        self.store.set(grant.token.clone());
        if let Some(identity) = &grant.identity {
            self.store.cache_identity_for(&grant.token, identity.clone());
        }
    }

    fn require_token(&self) -> ClientResult<Credential> {
        self.store
            .get()
            .ok_or_else(|| ClientError::Unauthorized("not logged in".to_string()))
    }

    async fn resolve_with(&self, token: &Credential) -> ClientResult<Identity> {
        match self.gateway.resolve_identity(token).await {
            Ok(identity) => {
                self.store.cache_identity_for(token, identity.clone());
                Ok(identity)
            }
            Err(e) => {
                self.handle_failure(token, &e);
                Err(e)
            }
        }
    }

    /// `Unauthorized`이면 강제 로그아웃 (다른 토큰이 이미 저장되었으면 유지).
    fn handle_failure(&self, token: &Credential, error: &ClientError) {
        if !error.requires_logout() {
            return;
        }
        if self.store.clear_if(token) {
            warn!("Token rejected by server, session cleared");
        } else {
            debug!("Rejected token is no longer current, keeping stored session");
        }
    }
}
