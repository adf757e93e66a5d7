//! 로그인, 회원가입, 로그아웃.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use signdesk_client::{AuthGrant, Session};
use signdesk_core::{route, CredentialStore};
use tracing::info;

/// 로그인 설정.
#[derive(Debug)]
pub struct LoginConfig {
    pub email: String,
    /// 지정하지 않으면 터미널에서 입력받음
    pub password: Option<SecretString>,
}

/// 회원가입 설정.
#[derive(Debug)]
pub struct RegisterConfig {
    pub email: String,
    pub password: Option<SecretString>,
    /// UPLOADER 또는 SIGNER
    pub role: String,
}

/// 명령줄 인자로 받은 비밀번호를 감쌉니다.
pub fn secret_password(password: Option<String>) -> Option<SecretString> {
    password.map(|p| SecretString::new(p.into()))
}

fn read_password(password: Option<SecretString>) -> Result<SecretString> {
    match password {
        Some(password) => Ok(password),
        None => rpassword::prompt_password("비밀번호: ")
            .map(|p| SecretString::new(p.into()))
            .context("Failed to read password"),
    }
}

fn print_grant<S: CredentialStore>(session: &Session<S>, grant: &AuthGrant) {
    match &grant.identity {
        Some(identity) => {
            println!("사용자: {} (#{})", identity.email, identity.id);
            println!("역할: {}", identity.role);
            let decision = route(Some(identity));
            if let Some(path) = decision.document_endpoint.path() {
                println!("문서 목록: {}", path);
            }
        }
        None => println!("신원 정보는 `signdesk whoami`로 확인하세요."),
    }
    if let Some(saved_at) = session.store().saved_at() {
        println!("저장 시각: {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}

/// 로그인.
pub async fn login<S: CredentialStore>(session: &Session<S>, config: LoginConfig) -> Result<()> {
    let password = read_password(config.password)?;

    let grant = session
        .login(&config.email, password.expose_secret())
        .await?;
    info!(email = %config.email, "Login completed");

    println!("\n✅ 로그인 완료");
    print_grant(session, &grant);
    Ok(())
}

/// 회원가입.
pub async fn register<S: CredentialStore>(
    session: &Session<S>,
    config: RegisterConfig,
) -> Result<()> {
    let password = read_password(config.password)?;

    let grant = session
        .register(&config.email, password.expose_secret(), &config.role)
        .await?;
    info!(email = %config.email, "Registration completed");

    println!("\n✅ 회원가입 완료");
    print_grant(session, &grant);
    Ok(())
}

/// 로그아웃.
pub fn logout<S: CredentialStore>(session: &Session<S>) {
    let was_logged_in = session.status().logged_in;
    session.logout();

    if was_logged_in {
        println!("👋 로그아웃되었습니다.");
    } else {
        println!("로그인된 세션이 없습니다.");
    }
}
