//! 역할별 문서 목록 조회.

use anyhow::Result;
use signdesk_client::Session;
use signdesk_core::{CredentialStore, Document, DocumentEndpoint};
use tracing::{error, info};

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(anyhow::anyhow!("Invalid format: {}. Use: table, json", s)),
        }
    }
}

/// 목록 한 줄: 업로더에게는 서명자를, 서명자에게는 업로더를 보여줌.
fn format_row(document: &Document, endpoint: DocumentEndpoint) -> String {
    let counterpart = match endpoint {
        DocumentEndpoint::Uploaded => document.signer.as_ref(),
        _ => document.uploader.as_ref(),
    }
    .map(|party| party.email.as_str())
    .unwrap_or("-");

    let marker = if document.status.awaiting_signature() {
        "⏳"
    } else {
        "  "
    };

    format!(
        "{} {:<6} {:<9} {:<30} {:<28} {}",
        marker,
        document.id,
        document.status.to_string(),
        document.display_title(),
        counterpart,
        document.file_url
    )
}

fn print_table(documents: &[Document], endpoint: DocumentEndpoint) {
    let counterpart = match endpoint {
        DocumentEndpoint::Uploaded => "서명자",
        _ => "업로더",
    };
    println!(
        "   {:<6} {:<9} {:<30} {:<28} {}",
        "ID", "상태", "제목", counterpart, "파일"
    );
    println!("{}", "-".repeat(100));
    for document in documents {
        println!("{}", format_row(document, endpoint));
    }
}

/// 문서 목록 조회.
///
/// 조회 실패 시 빈 목록을 출력하고 에러를 반환합니다.
pub async fn list_documents<S: CredentialStore>(
    session: &Session<S>,
    format: OutputFormat,
) -> Result<usize> {
    let listing = session.list_documents().await;

    if let Some(err) = listing.error {
        error!(error = %err, "Document listing failed");
        return Err(err.into());
    }

    let title = match listing.endpoint {
        DocumentEndpoint::Uploaded => "📄 내가 업로드한 문서",
        DocumentEndpoint::Assigned => "✍️  나에게 지정된 문서",
        DocumentEndpoint::None => {
            println!("이 역할로 조회할 수 있는 문서가 없습니다.");
            return Ok(0);
        }
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&listing.documents)?);
        }
        OutputFormat::Table => {
            println!("\n{} ({}건)\n", title, listing.documents.len());
            if listing.documents.is_empty() {
                println!("문서가 없습니다.");
            } else {
                print_table(&listing.documents, listing.endpoint);
            }
        }
    }

    info!(count = listing.documents.len(), "Documents listed");
    Ok(listing.documents.len())
}
