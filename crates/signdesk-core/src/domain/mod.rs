//! 문서 서명 워크플로를 위한 도메인 모델.

mod document;
mod identity;

pub use document::*;
pub use identity::*;
