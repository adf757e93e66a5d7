//! PDF 업로드 및 서명자 지정.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use signdesk_client::{CloudinaryHost, Session, UploadRequest};
use signdesk_core::{CredentialStore, UploadConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// 업로드 설정.
#[derive(Debug)]
pub struct UploadCommandConfig {
    pub file: PathBuf,
    pub title: String,
    pub description: String,
    /// 서명자 이메일
    pub signer: String,
}

/// PDF를 업로드하고 서명자에게 지정.
pub async fn upload<S: CredentialStore>(
    session: &Session<S>,
    upload_config: &UploadConfig,
    config: UploadCommandConfig,
) -> Result<()> {
    let request = UploadRequest::new(
        config.file,
        config.title,
        config.description,
        config.signer,
    );
    // 로컬 검증 실패는 스피너 없이 바로 보고
    request.check()?;

    let host = CloudinaryHost::new(upload_config.clone())?;

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Uploading {}...", request.file.display()));

    let title = request.title.clone();
    let signer = request.signer_email.clone();
    let result = session.upload_and_assign(&host, request).await;
    pb.finish_and_clear();

    let outcome = result?;
    info!(file_url = %outcome.file_url, "Document uploaded and assigned");

    println!("\n✅ 업로드 및 서명자 지정 완료");
    println!("제목: {}", title);
    println!("서명자: {}", signer);
    println!("파일: {}", outcome.file_url);
    if let Some(document) = outcome.document {
        println!("문서 ID: {} ({})", document.id, document.status);
    }
    Ok(())
}
