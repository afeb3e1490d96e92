use huat_leads::adapters::build_service;
use huat_leads::config::AppConfig;
use huat_leads::server::{build_router, AppState};
use huat_leads::utils::{logger, validation::Validate};
use lambda_http::{run, Error};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_json_logger();
    tracing::info!("Starting huat-leads Lambda function");

    let config_path = std::env::var("HUAT_LEADS_CONFIG").ok().map(PathBuf::from);
    let mut config = AppConfig::load(config_path.as_deref())?;

    // Lambda 只有 /tmp 可寫
    if config_path.is_none() {
        config.dead_letter.directory = "/tmp/huat-leads".to_string();
    }
    config.validate()?;

    let state = AppState::new(build_service(&config)?, config.is_preview());
    run(build_router(state)).await
}
