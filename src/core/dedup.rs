use crate::domain::layout::{SheetRow, EMAIL_COLUMN, PHONE_COLUMN};
use crate::domain::model::LeadSubmission;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 以哪些欄位判定「同一位使用者」
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOn {
    #[default]
    Email,
    EmailAndPhone,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub fn normalize_phone(phone: &str) -> String {
    phone.trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    email: String,
    phone: Option<String>,
}

impl IdentityKey {
    /// email 為空時無法識別，回傳 None
    pub fn new(email: &str, phone: &str, match_on: MatchOn) -> Option<Self> {
        let email = normalize_email(email);
        if email.is_empty() {
            return None;
        }
        let phone = match match_on {
            MatchOn::Email => None,
            MatchOn::EmailAndPhone => Some(normalize_phone(phone)),
        };
        Some(Self { email, phone })
    }

    pub fn for_lead(lead: &LeadSubmission, match_on: MatchOn) -> Option<Self> {
        Self::new(&lead.email, &lead.phone_number, match_on)
    }

    pub fn for_row(row: &SheetRow, match_on: MatchOn) -> Option<Self> {
        Self::new(row.cell(EMAIL_COLUMN), row.cell(PHONE_COLUMN), match_on)
    }
}

/// 讀一次整張表後建立的索引；同一個 key 以最上面那列為準
#[derive(Debug, Default)]
pub struct RowIndex {
    match_on: MatchOn,
    rows: HashMap<IdentityKey, SheetRow>,
}

impl RowIndex {
    pub fn build(rows: Vec<SheetRow>, match_on: MatchOn) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        for row in rows {
            if let Some(key) = IdentityKey::for_row(&row, match_on) {
                index.entry(key).or_insert(row);
            }
        }
        Self {
            match_on,
            rows: index,
        }
    }

    pub fn match_on(&self) -> MatchOn {
        self.match_on
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&SheetRow> {
        self.rows.get(key)
    }

    pub fn find(&self, email: &str, phone: &str) -> Option<&SheetRow> {
        IdentityKey::new(email, phone, self.match_on).and_then(|key| self.rows.get(&key))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
