use crate::domain::layout::{SheetRow, COLUMNS};
use crate::domain::model::LeadSubmission;
use crate::domain::ports::LeadStore;
use crate::utils::error::{LeadError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Map, Value};
use url::Url;

pub const SHEETDB_BASE_URL: &str = "https://sheetdb.io/api/v1";

/// SheetDB REST 代理；表頭必須是 snake_case 欄位名稱
pub struct SheetDbStore {
    client: Client,
    base_url: String,
    api_id: String,
}

impl SheetDbStore {
    pub fn new(client: Client, base_url: impl Into<String>, api_id: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_id: api_id.into(),
        }
    }

    fn url(&self, extra: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| LeadError::InvalidConfigValueError {
            field: "sheetdb.base_url".to_string(),
            value: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| LeadError::ConfigError {
                message: format!("{} cannot be used as a base URL", self.base_url),
            })?
            .pop_if_empty()
            .push(&self.api_id)
            .extend(extra);
        Ok(url)
    }

    async fn send(request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeadError::SheetApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    fn record(cells: &[String]) -> Value {
        let record: Map<String, Value> = COLUMNS
            .iter()
            .zip(cells)
            .map(|(column, cell)| (column.to_string(), Value::String(cell.clone())))
            .collect();
        Value::Object(record)
    }
}

#[async_trait]
impl LeadStore for SheetDbStore {
    fn name(&self) -> &'static str {
        "sheetdb"
    }

    async fn rows(&self) -> Result<Vec<SheetRow>> {
        let response = Self::send(self.client.get(self.url(&[])?)).await?;
        let records: Vec<Map<String, Value>> = response.json().await?;

        Ok(records
            .iter()
            .enumerate()
            .map(|(i, record)| SheetRow {
                number: i + 2,
                cells: LeadSubmission::from_record(record).to_row(),
            })
            .collect())
    }

    async fn append(&self, cells: &[String]) -> Result<()> {
        let body = serde_json::json!({ "data": [Self::record(cells)] });
        Self::send(self.client.post(self.url(&[])?).json(&body)).await?;
        tracing::debug!("📄 Appended row via SheetDB");
        Ok(())
    }

    /// SheetDB 只能依欄位值更新，會套用到所有相同 email 的列
    async fn update(&self, existing: &SheetRow, cells: &[String]) -> Result<()> {
        let url = self.url(&["email", existing.email()])?;
        let body = serde_json::json!({ "data": Self::record(cells) });
        Self::send(self.client.patch(url).json(&body)).await?;
        tracing::debug!("📄 Updated '{}' via SheetDB", existing.email());
        Ok(())
    }
}
