use clap::Parser;
use huat_leads::adapters::{build_service, storage::LocalStorage};
use huat_leads::config::cli::{Cli, Command};
use huat_leads::config::{AppConfig, LogFormat};
use huat_leads::core::export::export_csv;
use huat_leads::server::{build_router, AppState};
use huat_leads::utils::error::{ErrorSeverity, LeadError, Result};
use huat_leads::utils::{logger, validation::Validate};
use std::path::Path;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(cli.verbose);
            report_and_exit(&e);
        }
    };

    // 初始化日誌
    let json_logs = cli.json_logs || config.logging.format == LogFormat::Json;
    logger::init_logger(json_logs, config.logging.level.as_deref(), cli.verbose);

    tracing::info!("Starting huat-leads");
    if cli.verbose {
        tracing::debug!("CLI: {:?}", cli);
    }

    if let Err(e) = run(cli.command(), config).await {
        report_and_exit(&e);
    }
}

async fn run(command: Command, mut config: AppConfig) -> Result<()> {
    if let Command::Serve { bind: Some(bind) } = &command {
        config.server.bind = bind.clone();
    }

    // 驗證配置
    config.validate()?;

    match command {
        Command::Serve { .. } => serve(config).await,
        Command::Export { output } => export(config, &output).await,
        Command::Replay => replay(config).await,
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let bind_addr = config.bind_addr()?;
    if config.is_preview() {
        tracing::warn!("⚠️ No sheet transport configured; running in preview mode (in-memory store)");
    }

    let state = AppState::new(build_service(&config)?, config.is_preview());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, "🚀 huat-leads listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("🛑 Shutting down");
        })
        .await?;
    Ok(())
}

async fn export(config: AppConfig, output: &Path) -> Result<()> {
    let service = build_service(&config)?;
    let path = output.to_string_lossy();
    let rows = export_csv(&service, &LocalStorage::new("."), &path).await?;

    tracing::info!("✅ Exported {} row(s)", rows);
    println!("✅ Exported {} row(s) to {}", rows, path);
    Ok(())
}

async fn replay(config: AppConfig) -> Result<()> {
    let service = build_service(&config)?;
    let summary = service.replay().await?;

    tracing::info!(
        "✅ Replayed {} dead letter(s), {} remaining",
        summary.replayed,
        summary.remaining
    );
    println!(
        "✅ Replayed {} dead letter(s), {} remaining",
        summary.replayed, summary.remaining
    );
    Ok(())
}

fn report_and_exit(e: &LeadError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ huat-leads failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 4,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
