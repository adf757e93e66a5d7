//! # SignDesk Core
//!
//! 문서 서명 클라이언트의 핵심 도메인 모델과 세션 상태를 제공합니다.
//!
//! - 자격증명, 신원, 역할, 문서 모델
//! - 자격증명 저장소 (메모리 / 세션 파일)
//! - 역할 기반 라우터
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod router;
pub mod store;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use router::*;
pub use store::*;
