//! 外部系統的具體實作：各種試算表傳輸方式與本機檔案儲存。

pub mod apps_script;
pub mod memory;
pub mod sheetdb;
pub mod sheets_api;
pub mod storage;

use crate::config::{AppConfig, TransportKind};
use crate::core::auth::{ServiceAccountKey, TokenProvider};
use crate::core::dead_letter::DeadLetterLog;
use crate::core::lead_service::LeadService;
use crate::core::sheets::SheetsClient;
use crate::domain::ports::LeadStore;
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use self::apps_script::AppsScriptStore;
use self::memory::MemoryStore;
use self::sheetdb::SheetDbStore;
use self::sheets_api::SheetsApiStore;
use self::storage::LocalStorage;

pub type Service = LeadService<LocalStorage>;

pub fn http_client(config: &AppConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.transport.timeout_seconds))
        .build()?)
}

pub fn build_store(config: &AppConfig, client: Client) -> Result<Arc<dyn LeadStore>> {
    let store: Arc<dyn LeadStore> = match config.transport_kind() {
        TransportKind::SheetsApi => {
            let sheets = &config.sheets;
            let key = ServiceAccountKey::from_pem(
                validate_required_field("sheets.client_email", &sheets.client_email)?,
                validate_required_field("sheets.private_key", &sheets.private_key)?,
            )?;
            let tokens = Arc::new(TokenProvider::new(key, &sheets.token_uri, client.clone()));
            let sheets_client = SheetsClient::new(
                client,
                &sheets.api_base_url,
                validate_required_field("sheets.spreadsheet_id", &sheets.spreadsheet_id)?,
                sheets.sheet_name(),
                tokens,
            );
            Arc::new(SheetsApiStore::new(sheets_client))
        }
        TransportKind::SheetDb => Arc::new(SheetDbStore::new(
            client,
            &config.sheetdb.base_url,
            validate_required_field("sheetdb.api_id", &config.sheetdb.api_id)?,
        )),
        TransportKind::AppsScript => Arc::new(AppsScriptStore::new(
            client,
            validate_required_field("apps_script.webhook_url", &config.apps_script.webhook_url)?,
        )),
        TransportKind::Memory => Arc::new(MemoryStore::new()),
    };

    tracing::info!("🔌 Using {} transport", store.name());
    Ok(store)
}

pub fn dead_letter_log(config: &AppConfig) -> Option<DeadLetterLog<LocalStorage>> {
    let settings = &config.dead_letter;
    settings.enabled.then(|| {
        DeadLetterLog::new(LocalStorage::new(&settings.directory), settings.file.clone())
    })
}

pub fn build_service(config: &AppConfig) -> Result<Service> {
    let store = build_store(config, http_client(config)?)?;
    let mut service = LeadService::new(store)
        .with_retry(config.retry.clone())
        .with_match_on(config.dedup.match_on)
        .with_failure_policy(config.error_handling.on_submit_failure);

    if let Some(log) = dead_letter_log(config) {
        service = service.with_dead_letters(log);
    }
    Ok(service)
}
