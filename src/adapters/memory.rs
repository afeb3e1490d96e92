use crate::domain::layout::SheetRow;
use crate::domain::ports::LeadStore;
use crate::utils::error::{LeadError, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// 行程內的試算表替身：預覽模式與測試使用，列號從 2 開始
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn rows(&self) -> Result<Vec<SheetRow>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .enumerate()
            .map(|(i, cells)| SheetRow {
                number: i + 2,
                cells: cells.clone(),
            })
            .collect())
    }

    async fn append(&self, cells: &[String]) -> Result<()> {
        self.rows.write().await.push(cells.to_vec());
        Ok(())
    }

    async fn update(&self, existing: &SheetRow, cells: &[String]) -> Result<()> {
        let mut rows = self.rows.write().await;
        let slot = existing
            .number
            .checked_sub(2)
            .and_then(|i| rows.get_mut(i))
            .ok_or_else(|| LeadError::SheetApiError {
                status: 400,
                body: format!("row {} does not exist", existing.number),
            })?;
        *slot = cells.to_vec();
        Ok(())
    }
}
