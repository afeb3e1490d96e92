use crate::core::lead_service::LeadService;
use crate::domain::layout::{header_row, SheetRow};
use crate::domain::model::LeadSubmission;
use crate::domain::ports::Storage;
use crate::utils::error::{LeadError, Result};

/// 依固定欄位順序輸出 CSV（含標題列），短列補空欄
pub fn render_csv(rows: &[SheetRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header_row())?;
    for row in rows {
        writer.write_record(LeadSubmission::from_row(&row.cells).to_row())?;
    }
    writer
        .into_inner()
        .map_err(|e| LeadError::IoError(e.into_error()))
}

/// 讀取整張表並寫到 `output`，回傳資料列數
pub async fn export_csv<S, O>(service: &LeadService<S>, output: &O, path: &str) -> Result<usize>
where
    S: Storage,
    O: Storage,
{
    let rows = service.rows().await?;
    tracing::info!("📤 Exporting {} row(s) from {}", rows.len(), service.store_name());

    let data = render_csv(&rows)?;
    output.write_file(path, &data).await?;
    Ok(rows.len())
}
