//! 試算表欄位配置（A:R，共 18 欄）。
//!
//! 所有傳輸方式共用同一份欄位順序；去重只看 E 欄（email）與 F 欄（phone）。

use crate::domain::model::LeadSubmission;
use std::collections::HashMap;

pub const COLUMNS: [&str; 18] = [
    "timestamp",
    "action",
    "entry_point",
    "company_name",
    "email",
    "phone_number",
    "survey_q1",
    "survey_q2",
    "survey_q3",
    "gift",
    "referral_name",
    "referral_company",
    "referral_email",
    "referral_phone",
    "referral_position",
    "utm_source",
    "utm_medium",
    "utm_campaign",
];

pub const TIMESTAMP_COLUMN: usize = 0;
pub const EMAIL_COLUMN: usize = 4;
pub const PHONE_COLUMN: usize = 5;

/// 讀回來的一列資料，`number` 為試算表中 1 起算的列號（第 1 列是標題）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub number: usize,
    pub cells: Vec<String>,
}

impl SheetRow {
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn email(&self) -> &str {
        self.cell(EMAIL_COLUMN)
    }

    pub fn phone(&self) -> &str {
        self.cell(PHONE_COLUMN)
    }
}

pub fn header_row() -> Vec<String> {
    COLUMNS.iter().map(|c| c.to_string()).collect()
}

pub fn column_index(name: &str) -> Option<usize> {
    COLUMNS.iter().position(|c| *c == name)
}

/// 0 起算欄位索引 -> A1 欄名（本配置不超過 26 欄）
pub fn column_letter(index: usize) -> char {
    (b'A' + (index as u8 % 26)) as char
}

pub fn last_column() -> char {
    column_letter(COLUMNS.len() - 1)
}

/// 非字串的 JSON 值照原樣序列化成儲存格文字
pub fn json_to_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl LeadSubmission {
    fn fields(&self) -> [&String; 18] {
        [
            &self.timestamp,
            &self.action,
            &self.entry_point,
            &self.company_name,
            &self.email,
            &self.phone_number,
            &self.survey_q1,
            &self.survey_q2,
            &self.survey_q3,
            &self.gift,
            &self.referral_name,
            &self.referral_company,
            &self.referral_email,
            &self.referral_phone,
            &self.referral_position,
            &self.utm_source,
            &self.utm_medium,
            &self.utm_campaign,
        ]
    }

    fn fields_mut(&mut self) -> [&mut String; 18] {
        [
            &mut self.timestamp,
            &mut self.action,
            &mut self.entry_point,
            &mut self.company_name,
            &mut self.email,
            &mut self.phone_number,
            &mut self.survey_q1,
            &mut self.survey_q2,
            &mut self.survey_q3,
            &mut self.gift,
            &mut self.referral_name,
            &mut self.referral_company,
            &mut self.referral_email,
            &mut self.referral_phone,
            &mut self.referral_position,
            &mut self.utm_source,
            &mut self.utm_medium,
            &mut self.utm_campaign,
        ]
    }

    pub fn to_row(&self) -> Vec<String> {
        self.fields().into_iter().cloned().collect()
    }

    /// 缺少的儲存格補空字串，多出來的欄位忽略
    pub fn from_row(cells: &[String]) -> Self {
        let mut lead = Self::default();
        for (slot, cell) in lead.fields_mut().into_iter().zip(cells) {
            *slot = cell.clone();
        }
        lead
    }

    pub fn from_record(record: &serde_json::Map<String, serde_json::Value>) -> Self {
        let cells: Vec<String> = COLUMNS
            .iter()
            .map(|column| record.get(*column).map(json_to_cell).unwrap_or_default())
            .collect();
        Self::from_row(&cells)
    }

    pub fn to_record(&self) -> HashMap<&'static str, String> {
        COLUMNS
            .iter()
            .copied()
            .zip(self.fields().into_iter().cloned())
            .collect()
    }

    pub fn field(&self, column: &str) -> Option<&str> {
        column_index(column).map(|i| self.fields()[i].as_str())
    }

    /// 未知欄位回傳 false
    pub fn set_field(&mut self, column: &str, value: impl Into<String>) -> bool {
        match column_index(column) {
            Some(i) => {
                let mut fields = self.fields_mut();
                *fields[i] = value.into();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LeadSubmission {
        LeadSubmission {
            timestamp: "2026-02-04T09:30:00.000Z".to_string(),
            action: "entry".to_string(),
            company_name: "AJobThing".to_string(),
            email: "hr@ajobthing.com".to_string(),
            phone_number: "+60123456789".to_string(),
            utm_campaign: "cny".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_row_follows_column_order() {
        let row = sample().to_row();
        assert_eq!(row.len(), COLUMNS.len());
        assert_eq!(row[TIMESTAMP_COLUMN], "2026-02-04T09:30:00.000Z");
        assert_eq!(row[1], "entry");
        assert_eq!(row[3], "AJobThing");
        assert_eq!(row[EMAIL_COLUMN], "hr@ajobthing.com");
        assert_eq!(row[PHONE_COLUMN], "+60123456789");
        assert_eq!(row[17], "cny");
    }

    #[test]
    fn test_from_row_pads_short_rows() {
        let cells = vec![
            "2026-02-04".to_string(),
            "entry".to_string(),
            String::new(),
            "AJobThing".to_string(),
            "hr@ajobthing.com".to_string(),
        ];
        let lead = LeadSubmission::from_row(&cells);
        assert_eq!(lead.email, "hr@ajobthing.com");
        assert_eq!(lead.phone_number, "");
        assert_eq!(lead.to_row().len(), 18);
    }

    #[test]
    fn test_set_field_by_column_name() {
        let mut lead = sample();
        assert!(lead.set_field("gift", "RM50 voucher"));
        assert!(!lead.set_field("favourite_colour", "red"));
        assert_eq!(lead.field("gift"), Some("RM50 voucher"));
        assert_eq!(lead.field("favourite_colour"), None);
    }

    #[test]
    fn test_record_round_trip_through_json_object() {
        let record = serde_json::json!({
            "email": "hr@ajobthing.com",
            "phone_number": 60123456789u64,
            "gift": null
        });
        let lead = LeadSubmission::from_record(record.as_object().unwrap());
        assert_eq!(lead.phone_number, "60123456789");
        assert_eq!(lead.gift, "");
        assert_eq!(lead.to_record()["email"], "hr@ajobthing.com");
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter(0), 'A');
        assert_eq!(column_letter(EMAIL_COLUMN), 'E');
        assert_eq!(last_column(), 'R');
    }
}
