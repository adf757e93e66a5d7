//! SignDesk 백엔드 클라이언트.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 인증 게이트웨이 (로그인, 회원가입, 신원 확인)
//! - 문서 목록 조회 및 생성
//! - 파일 호스팅 업로드
//! - 저장소와 게이트웨이를 엮는 세션 코디네이터

pub mod auth;
pub mod documents;
pub mod error;
mod http;
pub mod session;
pub mod upload;

pub use auth::{AuthGateway, AuthGrant};
pub use documents::DocumentService;
pub use error::{ClientError, ClientResult};
pub use session::{DocumentListing, Session, SessionStatus};
pub use upload::{CloudinaryHost, FileHost, UploadOutcome, UploadRequest};
