#[cfg(feature = "cli")]
pub mod cli;

use crate::adapters::sheetdb::SHEETDB_BASE_URL;
use crate::core::auth::GOOGLE_TOKEN_URI;
use crate::core::dedup::MatchOn;
use crate::core::lead_service::FailurePolicy;
use crate::core::retry::RetryPolicy;
use crate::core::sheets::SHEETS_API_BASE_URL;
use crate::utils::error::{LeadError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_required_field, validate_url,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("env placeholder pattern is valid")
});

pub const DEFAULT_SHEET_NAME: &str = "Ahuathing";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub transport: TransportConfig,
    pub sheets: SheetsConfig,
    pub sheetdb: SheetDbConfig,
    pub apps_script: AppsScriptConfig,
    pub dedup: DedupConfig,
    pub retry: RetryPolicy,
    pub error_handling: ErrorHandlingConfig,
    pub dead_letter: DeadLetterConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    SheetsApi,
    SheetDb,
    AppsScript,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// 未指定時依已設定的憑證自動選擇，都沒有則進入預覽模式（記憶體）
    pub kind: Option<TransportKind>,
    pub timeout_seconds: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: None,
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub spreadsheet_id: Option<String>,
    pub sheet_name: Option<String>,
    pub client_email: Option<String>,
    pub private_key: Option<String>,
    pub token_uri: String,
    pub api_base_url: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            sheet_name: None,
            client_email: None,
            private_key: None,
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            api_base_url: SHEETS_API_BASE_URL.to_string(),
        }
    }
}

impl SheetsConfig {
    pub fn sheet_name(&self) -> &str {
        self.sheet_name.as_deref().unwrap_or(DEFAULT_SHEET_NAME)
    }

    fn has_credentials(&self) -> bool {
        [&self.spreadsheet_id, &self.client_email, &self.private_key]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetDbConfig {
    pub api_id: Option<String>,
    pub base_url: String,
}

impl Default for SheetDbConfig {
    fn default() -> Self {
        Self {
            api_id: None,
            base_url: SHEETDB_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppsScriptConfig {
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub match_on: MatchOn,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorHandlingConfig {
    pub on_submit_failure: FailurePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadLetterConfig {
    pub enabled: bool,
    pub directory: String,
    pub file: String,
}

impl Default for DeadLetterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: "./data".to_string(),
            file: "dead_letters.jsonl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// EnvFilter 語法，例如 `huat_leads=debug`
    pub level: Option<String>,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| LeadError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GOOGLE_PRIVATE_KEY})；未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 有設定檔就讀檔，否則使用預設值；之後補上環境變數
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// 部署環境沿用的變數名稱，只填補設定檔沒給的欄位
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |slot: &mut Option<String>, name: &str| {
            if !matches!(slot.as_deref(), Some(s) if !s.trim().is_empty()) {
                if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                    *slot = Some(value);
                }
            }
        };

        fill(&mut self.sheets.client_email, "GOOGLE_SERVICE_ACCOUNT_EMAIL");
        fill(&mut self.sheets.private_key, "GOOGLE_PRIVATE_KEY");
        fill(&mut self.sheets.spreadsheet_id, "GOOGLE_SHEET_ID");
        fill(&mut self.sheets.sheet_name, "GOOGLE_SHEET_NAME");
        fill(&mut self.apps_script.webhook_url, "GOOGLE_SHEETS_WEBHOOK_URL");
        fill(&mut self.sheetdb.api_id, "SHEETDB_API_ID");
    }

    /// 實際使用的傳輸方式
    pub fn transport_kind(&self) -> TransportKind {
        if let Some(kind) = self.transport.kind {
            return kind;
        }
        if self.sheets.has_credentials() {
            TransportKind::SheetsApi
        } else if self.sheetdb.api_id.is_some() {
            TransportKind::SheetDb
        } else if self.apps_script.webhook_url.is_some() {
            TransportKind::AppsScript
        } else {
            TransportKind::Memory
        }
    }

    /// 沒有任何憑證、自動落到記憶體時視為預覽模式；明確指定 memory 則不是
    pub fn is_preview(&self) -> bool {
        self.transport.kind.is_none() && self.transport_kind() == TransportKind::Memory
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|e: std::net::AddrParseError| LeadError::InvalidConfigValueError {
                field: "server.bind".to_string(),
                value: self.server.bind.clone(),
                reason: e.to_string(),
            })
    }

    /// 必填且不可為空白
    fn require<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str> {
        let value = validate_required_field(field, value)?.as_str();
        validate_non_empty_string(field, value)?;
        Ok(value)
    }

    pub fn validate_config(&self) -> Result<()> {
        self.bind_addr()?;

        match self.transport_kind() {
            TransportKind::SheetsApi => {
                Self::require("sheets.spreadsheet_id", &self.sheets.spreadsheet_id)?;
                Self::require("sheets.client_email", &self.sheets.client_email)?;
                Self::require("sheets.private_key", &self.sheets.private_key)?;
                validate_non_empty_string("sheets.sheet_name", self.sheets.sheet_name())?;
                validate_url("sheets.token_uri", &self.sheets.token_uri)?;
                validate_url("sheets.api_base_url", &self.sheets.api_base_url)?;
            }
            TransportKind::SheetDb => {
                Self::require("sheetdb.api_id", &self.sheetdb.api_id)?;
                validate_url("sheetdb.base_url", &self.sheetdb.base_url)?;
            }
            TransportKind::AppsScript => {
                let url = Self::require("apps_script.webhook_url", &self.apps_script.webhook_url)?;
                validate_url("apps_script.webhook_url", url)?;
            }
            TransportKind::Memory => {}
        }

        validate_range("transport.timeout_seconds", self.transport.timeout_seconds, 1, 300)?;
        validate_range("retry.retry_attempts", self.retry.retry_attempts, 1, 10)?;
        validate_range(
            "retry.retry_delay_ms",
            self.retry.retry_delay_ms,
            0,
            self.retry.max_delay_ms,
        )?;

        if self.dead_letter.enabled {
            validate_path("dead_letter.directory", &self.dead_letter.directory)?;
            validate_path("dead_letter.file", &self.dead_letter.file)?;
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
