use crate::core::auth::TokenProvider;
use crate::domain::layout::{json_to_cell, last_column};
use crate::utils::error::{LeadError, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

pub const SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Google Sheets v4 `spreadsheets.values` 的最小客戶端
pub struct SheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    tokens: Arc<TokenProvider>,
}

impl SheetsClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        tokens: Arc<TokenProvider>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            tokens,
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// 整張表的範圍，例如 `Ahuathing!A:R`
    pub fn full_range(&self) -> String {
        format!("{}!A:{}", self.sheet_name, last_column())
    }

    /// 單列範圍，例如 `Ahuathing!A7:R7`
    pub fn row_range(&self, row_number: usize) -> String {
        format!(
            "{}!A{}:{}{}",
            self.sheet_name,
            row_number,
            last_column(),
            row_number
        )
    }

    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| LeadError::InvalidConfigValueError {
            field: "sheets.api_base_url".to_string(),
            value: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| LeadError::ConfigError {
                message: format!("{} cannot be used as a base URL", self.base_url),
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.tokens.invalidate().await;
            }
            let body = response.text().await.unwrap_or_default();
            return Err(LeadError::SheetApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// 讀取整張表（含標題列），儲存格一律轉成文字
    pub async fn read_rows(&self) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(&self.full_range())?;
        tracing::debug!("📄 Reading {}", self.full_range());

        let response = self.authorized(self.client.get(url)).await?;
        let range: ValueRange = response.json().await?;

        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(json_to_cell).collect())
            .collect())
    }

    pub async fn append_row(&self, cells: &[String]) -> Result<()> {
        let url = self.values_url(&format!("{}:append", self.full_range()))?;
        let request = self
            .client
            .post(url)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&serde_json::json!({ "values": [cells] }));

        self.authorized(request).await?;
        tracing::debug!("📄 Appended row to {}", self.sheet_name);
        Ok(())
    }

    pub async fn update_row(&self, row_number: usize, cells: &[String]) -> Result<()> {
        let url = self.values_url(&self.row_range(row_number))?;
        let request = self
            .client
            .put(url)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&serde_json::json!({ "values": [cells] }));

        self.authorized(request).await?;
        tracing::debug!("📄 Updated row {} of {}", row_number, self.sheet_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::ServiceAccountKey;
    use httpmock::prelude::*;

    const TEST_KEY: &str = include_str!("../../tests/fixtures/service_account_key.pem");

    fn client_for(server: &MockServer) -> SheetsClient {
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .json_body(serde_json::json!({"access_token": "ya29.sheets", "expires_in": 3600}));
        });
        let key = ServiceAccountKey::from_pem("svc@example.com", TEST_KEY).unwrap();
        let tokens = Arc::new(TokenProvider::new(key, server.url("/token"), Client::new()));
        SheetsClient::new(Client::new(), server.base_url(), "sheet-123", "Ahuathing", tokens)
    }

    #[test]
    fn test_ranges() {
        let server = MockServer::start();
        let client = client_for(&server);
        assert_eq!(client.full_range(), "Ahuathing!A:R");
        assert_eq!(client.row_range(7), "Ahuathing!A7:R7");
    }

    #[tokio::test]
    async fn test_read_rows_converts_cells_to_text() {
        let server = MockServer::start();
        let read_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v4/spreadsheets/sheet-123/values/Ahuathing!A:R")
                .header("authorization", "Bearer ya29.sheets");
            then.status(200).json_body(serde_json::json!({
                "range": "Ahuathing!A1:R2",
                "majorDimension": "ROWS",
                "values": [
                    ["timestamp", "action"],
                    ["2026-02-04T09:30:00.000Z", "entry", "", "AJobThing", "hr@ajobthing.com", 60123456789u64]
                ]
            }));
        });

        let client = client_for(&server);
        let rows = client.read_rows().await.unwrap();

        read_mock.assert();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][4], "hr@ajobthing.com");
        assert_eq!(rows[1][5], "60123456789");
    }

    #[tokio::test]
    async fn test_read_empty_sheet() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/v4/spreadsheets/sheet-123/values/Ahuathing!A:R");
            then.status(200)
                .json_body(serde_json::json!({"range": "Ahuathing!A1:R1000", "majorDimension": "ROWS"}));
        });

        let client = client_for(&server);
        assert!(client.read_rows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_and_update_requests() {
        let server = MockServer::start();
        let row = vec!["2026-02-04T09:30:00.000Z".to_string(), "entry".to_string()];

        let append_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v4/spreadsheets/sheet-123/values/Ahuathing!A:R:append")
                .query_param("valueInputOption", "USER_ENTERED")
                .query_param("insertDataOption", "INSERT_ROWS")
                .json_body(serde_json::json!({"values": [["2026-02-04T09:30:00.000Z", "entry"]]}));
            then.status(200).json_body(serde_json::json!({"updates": {"updatedRows": 1}}));
        });
        let update_mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/v4/spreadsheets/sheet-123/values/Ahuathing!A3:R3")
                .query_param("valueInputOption", "USER_ENTERED");
            then.status(200).json_body(serde_json::json!({"updatedRows": 1}));
        });

        let client = client_for(&server);
        client.append_row(&row).await.unwrap();
        client.update_row(3, &row).await.unwrap();

        append_mock.assert();
        update_mock.assert();
    }

    #[tokio::test]
    async fn test_api_error_carries_status_and_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/v4/spreadsheets/sheet-123/values/Ahuathing!A:R");
            then.status(403)
                .body("The caller does not have permission");
        });

        let client = client_for(&server);
        match client.read_rows().await {
            Err(LeadError::SheetApiError { status, body }) => {
                assert_eq!(status, 403);
                assert!(body.contains("permission"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
