//! SignDesk 문서 서명 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 업로더로 회원가입
//! signdesk register a@x.com --role UPLOADER
//!
//! # 로그인 후 신원 확인
//! signdesk login a@x.com
//! signdesk whoami
//!
//! # PDF 업로드 후 서명자 지정
//! signdesk upload contract.pdf --title "NDA" --signer s@x.com
//!
//! # 역할별 문서 목록
//! signdesk documents
//! ```

use clap::{Parser, Subcommand};
use signdesk_cli::commands::{
    account::{self, secret_password, LoginConfig, RegisterConfig},
    describe_failure,
    documents::{self, OutputFormat},
    log_config, open_session, status,
    upload::{self, UploadCommandConfig},
};
use signdesk_core::{init_logging, AppConfig, LogFormat, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "signdesk")]
#[command(about = "SignDesk - 문서 업로드 및 전자 서명 클라이언트", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// 디버그 로그 출력
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 로그 형식 (pretty, json, compact). 설정 파일보다 우선
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 이메일/비밀번호로 로그인
    Login {
        /// 이메일
        email: String,

        /// 비밀번호 (지정하지 않으면 입력 프롬프트)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// 새 계정 등록
    Register {
        /// 이메일
        email: String,

        /// 역할 (UPLOADER: 문서 업로드, SIGNER: 문서 서명)
        #[arg(short, long)]
        role: String,

        /// 비밀번호 (지정하지 않으면 입력 프롬프트)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// 로그아웃 (세션 삭제)
    Logout,

    /// 서버에서 현재 신원 확인
    Whoami,

    /// 로컬 세션 상태 확인 (네트워크 호출 없음)
    Status,

    /// 역할별 문서 목록
    Documents {
        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// PDF 업로드 후 서명자 지정
    Upload {
        /// PDF 파일 경로
        file: PathBuf,

        /// 문서 제목
        #[arg(short, long)]
        title: String,

        /// 문서 설명
        #[arg(short, long, default_value = "")]
        description: String,

        /// 서명자 이메일
        #[arg(short, long)]
        signer: String,
    },
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let session = open_session(&config)?;

    match cli.command {
        Commands::Login { email, password } => {
            let password = secret_password(password);
            account::login(&session, LoginConfig { email, password }).await?;
        }

        Commands::Register {
            email,
            role,
            password,
        } => {
            account::register(
                &session,
                RegisterConfig {
                    email,
                    password: secret_password(password),
                    role,
                },
            )
            .await?;
        }

        Commands::Logout => account::logout(&session),

        Commands::Whoami => status::whoami(&session).await?,

        Commands::Status => status::print_status(&session, &config.session.resolved_path()),

        Commands::Documents { format } => {
            let format = OutputFormat::parse(&format)?;
            documents::list_documents(&session, format).await?;
        }

        Commands::Upload {
            file,
            title,
            description,
            signer,
        } => {
            upload::upload(
                &session,
                &config.upload,
                UploadCommandConfig {
                    file,
                    title,
                    description,
                    signer,
                },
            )
            .await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ 설정을 불러오지 못했습니다: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = init_logging(log_config(&config.logging, cli.verbose, cli.log_format)) {
        eprintln!("⚠️  로깅 초기화 실패: {}", e);
    }
    info!(config = %cli.config, api = %config.api.base_url, "SignDesk CLI started");

    if let Err(e) = run(cli, config).await {
        error!(error = %e, "Command failed");
        eprintln!("\n❌ {}", describe_failure(&e));
        std::process::exit(1);
    }
}
