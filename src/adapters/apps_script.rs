use crate::domain::layout::SheetRow;
use crate::domain::ports::LeadStore;
use crate::utils::error::{LeadError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Apps Script 網頁應用程式的參數名稱，順序與 `COLUMNS` 相同
pub const WEBHOOK_PARAMS: [&str; 18] = [
    "timestamp",
    "action",
    "entryPoint",
    "companyName",
    "email",
    "phoneNumber",
    "surveyQ1_resignationFrequency",
    "surveyQ2_hiringPlan",
    "surveyQ3_headcount",
    "gift",
    "referralName",
    "referralCompany",
    "referralEmail",
    "referralPhone",
    "referralJobPosition",
    "utmSource",
    "utmMedium",
    "utmCampaign",
];

/// 只能寫入的 webhook：每筆資料以 GET 查詢字串送出
pub struct AppsScriptStore {
    client: Client,
    webhook_url: String,
}

impl AppsScriptStore {
    pub fn new(client: Client, webhook_url: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl LeadStore for AppsScriptStore {
    fn name(&self) -> &'static str {
        "apps_script"
    }

    fn supports_reads(&self) -> bool {
        false
    }

    async fn rows(&self) -> Result<Vec<SheetRow>> {
        Err(LeadError::unsupported(self.name(), "reading rows"))
    }

    async fn append(&self, cells: &[String]) -> Result<()> {
        let params: Vec<(&str, &str)> = WEBHOOK_PARAMS
            .iter()
            .copied()
            .zip(cells.iter().map(String::as_str))
            .collect();

        let response = self
            .client
            .get(&self.webhook_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeadError::SheetApiError {
                status: status.as_u16(),
                body,
            });
        }
        tracing::debug!("📄 Forwarded row to Apps Script webhook");
        Ok(())
    }

    async fn update(&self, _existing: &SheetRow, _cells: &[String]) -> Result<()> {
        Err(LeadError::unsupported(self.name(), "updating rows"))
    }
}
