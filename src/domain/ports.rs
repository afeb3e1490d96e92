use crate::domain::layout::SheetRow;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn append_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 來源不存在時回傳 `Ok(false)`
    fn rename_file(
        &self,
        from: &str,
        to: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 試算表後端（Sheets API、SheetDB、Apps Script、記憶體）
#[async_trait]
pub trait LeadStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// 只能寫入的後端（例如 Apps Script webhook）回傳 false
    fn supports_reads(&self) -> bool {
        true
    }

    /// 標題列以外的所有資料列
    async fn rows(&self) -> Result<Vec<SheetRow>>;

    async fn append(&self, cells: &[String]) -> Result<()>;

    async fn update(&self, existing: &SheetRow, cells: &[String]) -> Result<()>;
}
