//! SignDesk CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 로그인 / 회원가입 / 로그아웃
//! - 현재 신원 및 세션 상태 확인
//! - 역할별 문서 목록 조회
//! - PDF 업로드 및 서명자 지정

pub mod commands;

pub use commands::*;
