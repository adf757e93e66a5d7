//! 세션 상태와 현재 신원 확인.

use anyhow::Result;
use signdesk_client::Session;
use signdesk_core::{route, Action, CredentialStore};
use std::path::Path;
use tracing::info;

/// 로컬 세션 상태 출력 (네트워크 호출 없음).
pub fn print_status<S: CredentialStore>(session: &Session<S>, session_path: &Path) {
    let status = session.status();

    println!("세션 파일: {}", session_path.display());
    if !status.logged_in {
        println!("상태: 로그아웃");
        return;
    }

    println!("상태: 로그인");
    if let Some(saved_at) = status.saved_at {
        println!("저장 시각: {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    match status.cached_identity {
        Some(identity) => println!(
            "마지막 확인 신원: {} ({}) - 서버 확인은 `signdesk whoami`",
            identity.email, identity.role
        ),
        None => println!("마지막 확인 신원: 없음"),
    }
}

/// 서버에서 신원을 확인하고 권한을 출력.
pub async fn whoami<S: CredentialStore>(session: &Session<S>) -> Result<()> {
    let identity = session.current_identity().await?;
    let decision = route(Some(&identity));
    info!(user_id = identity.id, "Identity verified");

    println!("\n👤 {} (#{})", identity.email, identity.id);
    println!("역할: {}", identity.role);

    if decision.is_no_access() {
        println!("⚠️  알 수 없는 역할입니다. 사용할 수 있는 기능이 없습니다.");
        return Ok(());
    }

    let actions: Vec<&str> = decision
        .allowed_actions
        .iter()
        .map(Action::description)
        .collect();
    println!("허용 작업: {}", actions.join(", "));
    if let Some(path) = decision.document_endpoint.path() {
        println!("문서 목록: {}", path);
    }
    Ok(())
}
