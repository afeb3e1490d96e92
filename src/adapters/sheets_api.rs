use crate::core::sheets::SheetsClient;
use crate::domain::layout::{header_row, SheetRow};
use crate::domain::ports::LeadStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// 直接呼叫 Google Sheets API（服務帳戶授權）。
/// 第 1 列是標題列；讀到完全空白的表時，下一次新增會先補上標題列。
pub struct SheetsApiStore {
    client: SheetsClient,
    missing_header: AtomicBool,
}

impl SheetsApiStore {
    pub fn new(client: SheetsClient) -> Self {
        Self {
            client,
            missing_header: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl LeadStore for SheetsApiStore {
    fn name(&self) -> &'static str {
        "sheets_api"
    }

    async fn rows(&self) -> Result<Vec<SheetRow>> {
        let values = self.client.read_rows().await?;
        self.missing_header.store(values.is_empty(), Ordering::SeqCst);
        Ok(values
            .into_iter()
            .enumerate()
            .skip(1)
            .map(|(i, cells)| SheetRow {
                number: i + 1,
                cells,
            })
            .collect())
    }

    async fn append(&self, cells: &[String]) -> Result<()> {
        if self.missing_header.load(Ordering::SeqCst) {
            self.client.update_row(1, &header_row()).await?;
            self.missing_header.store(false, Ordering::SeqCst);
            tracing::info!("🏷️ Wrote header row to empty sheet");
        }
        self.client.append_row(cells).await
    }

    async fn update(&self, existing: &SheetRow, cells: &[String]) -> Result<()> {
        self.client.update_row(existing.number, cells).await
    }
}
