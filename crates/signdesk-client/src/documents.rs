//! 문서 서비스.
//!
//! - 업로드한 문서 목록 (GET /documents/uploaded)
//! - 지정된 문서 목록 (GET /documents/assigned)
//! - 문서 생성 및 서명자 지정 (POST /documents)

use crate::http::{self, CallKind};
use crate::{ClientError, ClientResult};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use signdesk_core::{ApiConfig, Credential, Document, DocumentEndpoint, NewDocument};
use tracing::{debug, info, instrument, warn};

/// 문서 API 클라이언트.
#[derive(Debug, Clone)]
pub struct DocumentService {
    client: Client,
    base_url: String,
}

impl DocumentService {
    /// API 설정으로 서비스 생성.
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        Ok(Self::with_client(
            http::build_client(config.timeout_secs)?,
            config.base_url.clone(),
        ))
    }

    /// 기존 HTTP 클라이언트로 서비스 생성.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// 엔드포인트의 문서 목록 조회.
    ///
    /// `DocumentEndpoint::None`이면 요청 없이 빈 목록을 반환합니다.
    #[instrument(skip(self, token))]
    pub async fn list(
        &self,
        token: &Credential,
        endpoint: DocumentEndpoint,
    ) -> ClientResult<Vec<Document>> {
        let Some(path) = endpoint.path() else {
            debug!("No document endpoint for this role, skipping request");
            return Ok(Vec::new());
        };

        let authorization = http::bearer_header(token)?;
        let url = http::join_url(&self.base_url, path);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        let (status, body) = http::read_body(response).await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), path, "Document listing failed");
            return Err(http::error_for_status(CallKind::Authenticated, status, &body));
        }

        let documents: Vec<Document> = serde_json::from_str(&body).map_err(|e| {
            ClientError::Parse(format!("Failed to parse document list: {}", e))
        })?;
        debug!(count = documents.len(), path, "Documents fetched");
        Ok(documents)
    }

    /// 문서를 생성하고 서명자를 지정.
    ///
    /// 성공 응답에 문서가 포함되어 있으면 함께 반환합니다.
    #[instrument(skip(self, token, document), fields(assigned_to = %document.assigned_to_email))]
    pub async fn create_document(
        &self,
        token: &Credential,
        document: &NewDocument,
    ) -> ClientResult<Option<Document>> {
        let authorization = http::bearer_header(token)?;
        let url = http::join_url(&self.base_url, "/documents");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, authorization)
            .json(document)
            .send()
            .await?;

        let (status, body) = http::read_body(response).await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "Document creation failed");
            return Err(http::error_for_status(CallKind::Authenticated, status, &body));
        }

        let created = serde_json::from_str::<Document>(&body).ok();
        info!(document_id = ?created.as_ref().map(|d| d.id), "Document created and assigned");
        Ok(created)
    }
}
