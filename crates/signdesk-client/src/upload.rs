//! 파일 호스팅 업로드.
//!
//! PDF 바이너리는 외부 파일 호스팅에 먼저 올리고, 받은 공개 URL만 백엔드에 전달합니다.

use crate::http;
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use signdesk_core::{Document, UploadConfig};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use validator::Validate;

/// 파일 호스팅 인터페이스.
#[async_trait]
pub trait FileHost: Send + Sync {
    /// 호스트 이름 반환.
    fn name(&self) -> &str;

    /// PDF 파일을 올리고 공개 URL 반환.
    async fn upload_pdf(&self, path: &Path) -> ClientResult<String>;
}

/// 업로드 및 서명자 지정 요청.
#[derive(Debug, Clone, Validate)]
pub struct UploadRequest {
    /// 업로드할 PDF 경로
    pub file: PathBuf,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub description: String,
    /// 서명자 이메일
    #[validate(email(message = "signer email must be a valid email address"))]
    pub signer_email: String,
}

impl UploadRequest {
    /// 요청 생성 (앞뒤 공백 제거).
    pub fn new(
        file: impl Into<PathBuf>,
        title: impl Into<String>,
        description: impl Into<String>,
        signer_email: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            title: title.into().trim().to_string(),
            description: description.into().trim().to_string(),
            signer_email: signer_email.into().trim().to_string(),
        }
    }

    /// 네트워크 호출 전 로컬 검증.
    ///
    /// 제목과 서명자 이메일은 필수이며, 파일은 존재하는 `.pdf`여야 합니다.
    pub fn check(&self) -> ClientResult<()> {
        self.validate()?;

        let is_pdf = self
            .file
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return Err(ClientError::Validation(format!(
                "{} is not a PDF file",
                self.file.display()
            )));
        }
        if !self.file.is_file() {
            return Err(ClientError::Validation(format!(
                "{} does not exist",
                self.file.display()
            )));
        }

        Ok(())
    }
}

/// 업로드 및 지정 결과.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// 파일 호스팅 공개 URL
    pub file_url: String,
    /// 백엔드가 돌려준 문서 (있을 경우)
    pub document: Option<Document>,
}

/// 업로드 응답.
#[derive(Debug, Deserialize)]
struct HostedFile {
    #[serde(default)]
    secure_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Cloudinary 호환 서명 없는(unsigned) 업로드.
#[derive(Debug, Clone)]
pub struct CloudinaryHost {
    client: Client,
    config: UploadConfig,
}

impl CloudinaryHost {
    /// 업로드 설정으로 호스트 생성.
    pub fn new(config: UploadConfig) -> ClientResult<Self> {
        let client = http::build_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    fn upload_url(&self) -> String {
        http::join_url(
            &self.config.base_url,
            &format!("/v1_1/{}/auto/upload", self.config.cloud_name.trim()),
        )
    }
}

#[async_trait]
impl FileHost for CloudinaryHost {
    fn name(&self) -> &str {
        "cloudinary"
    }

    #[instrument(skip(self), fields(file = %path.display()))]
    async fn upload_pdf(&self, path: &Path) -> ClientResult<String> {
        if !self.config.is_configured() {
            return Err(ClientError::Validation(
                "upload.cloud_name and upload.upload_preset must be configured".to_string(),
            ));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::Upload(format!("cannot read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        let size = bytes.len();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| ClientError::Upload(e.to_string()))?;
        let form = Form::new()
            .text("upload_preset", self.config.upload_preset.clone())
            .part("file", part);

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let (status, body) = http::read_body(response).await?;
        if !status.is_success() {
            let message = http::extract_message(&body).unwrap_or_else(|| status.to_string());
            warn!(status = status.as_u16(), "File hosting rejected upload");
            return Err(ClientError::Upload(message));
        }

        let hosted: HostedFile = serde_json::from_str(&body)
            .map_err(|e| ClientError::Upload(format!("unexpected hosting response: {}", e)))?;
        let url = hosted
            .secure_url
            .or(hosted.url)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ClientError::Upload("hosting response had no file URL".to_string()))?;

        info!(bytes = size, "PDF uploaded to file hosting");
        Ok(url)
    }
}
