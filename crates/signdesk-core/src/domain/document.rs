//! 문서 모델.
//!
//! 문서의 수명 주기는 백엔드가 소유하며, 클라이언트는 스냅샷만 읽습니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 문서 처리 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// 서명 대기
    Pending,
    /// 서명 완료
    Signed,
    /// 검증 완료
    Verified,
    /// 거부됨
    Rejected,
}

impl DocumentStatus {
    /// 서명자의 조치가 필요한 상태인지 확인.
    pub fn awaiting_signature(&self) -> bool {
        matches!(self, DocumentStatus::Pending)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentStatus::Pending => "PENDING",
            DocumentStatus::Signed => "SIGNED",
            DocumentStatus::Verified => "VERIFIED",
            DocumentStatus::Rejected => "REJECTED",
        };
        write!(f, "{}", s)
    }
}

/// 문서 당사자 (업로더 또는 서명자).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub email: String,
}

/// 백엔드가 반환하는 문서 스냅샷.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    /// 파일 호스팅 URL
    pub file_url: String,
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<Party>,
}

impl Document {
    /// 표시용 제목 (없으면 `#id`).
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(t) if !t.trim().is_empty() => t.clone(),
            _ => format!("#{}", self.id),
        }
    }
}

/// `POST /documents` 요청 본문.
///
/// 바이너리가 아닌 파일 호스팅 URL만 전달합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub title: String,
    pub description: String,
    pub original_url: String,
    pub assigned_to_email: String,
}
