//! 역할 기반 라우팅.
//!
//! 현재 신원으로부터 허용 작업과 조회할 문서 목록 엔드포인트를 결정합니다.
//! 부수효과 없는 순수 조회 테이블입니다.

use crate::domain::{Identity, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 사용자 작업.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// PDF 업로드
    Upload,
    /// 서명자 지정
    Assign,
    /// 지정된 문서 조회
    View,
    /// 서명
    Sign,
}

impl Action {
    /// 작업 설명 반환.
    pub fn description(&self) -> &'static str {
        match self {
            Action::Upload => "문서 업로드",
            Action::Assign => "서명자 지정",
            Action::View => "지정 문서 조회",
            Action::Sign => "문서 서명",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Upload => "upload",
            Action::Assign => "assign",
            Action::View => "view",
            Action::Sign => "sign",
        };
        write!(f, "{}", s)
    }
}

/// 문서 목록 엔드포인트.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentEndpoint {
    /// 내가 업로드한 문서
    Uploaded,
    /// 나에게 지정된 문서
    Assigned,
    /// 조회 불가
    None,
}

impl DocumentEndpoint {
    /// 요청 경로 반환 (`None`이면 요청하지 않음).
    pub fn path(&self) -> Option<&'static str> {
        match self {
            DocumentEndpoint::Uploaded => Some("/documents/uploaded"),
            DocumentEndpoint::Assigned => Some("/documents/assigned"),
            DocumentEndpoint::None => None,
        }
    }
}

/// 라우팅 결정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub allowed_actions: BTreeSet<Action>,
    pub document_endpoint: DocumentEndpoint,
}

impl RouteDecision {
    /// 아무 권한도 없는 결정.
    pub fn no_access() -> Self {
        Self {
            allowed_actions: BTreeSet::new(),
            document_endpoint: DocumentEndpoint::None,
        }
    }

    /// 작업 허용 여부.
    pub fn permits(&self, action: Action) -> bool {
        self.allowed_actions.contains(&action)
    }

    /// 권한이 하나도 없는지 확인.
    pub fn is_no_access(&self) -> bool {
        self.allowed_actions.is_empty() && self.document_endpoint == DocumentEndpoint::None
    }
}

/// 역할에 대한 라우팅 결정.
pub fn route_role(role: Role) -> RouteDecision {
    match role {
        Role::Uploader => RouteDecision {
            allowed_actions: [Action::Upload, Action::Assign].into_iter().collect(),
            document_endpoint: DocumentEndpoint::Uploaded,
        },
        Role::Signer => RouteDecision {
            allowed_actions: [Action::View, Action::Sign].into_iter().collect(),
            document_endpoint: DocumentEndpoint::Assigned,
        },
        Role::Unknown => RouteDecision::no_access(),
    }
}

/// 신원(없을 수 있음)에 대한 라우팅 결정.
pub fn route(identity: Option<&Identity>) -> RouteDecision {
    match identity {
        Some(identity) => route_role(identity.role),
        None => RouteDecision::no_access(),
    }
}
