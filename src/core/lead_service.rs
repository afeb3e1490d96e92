//! 名單寫入與查詢：去重 upsert、重試、失敗紀錄與每日遊玩限制。

use crate::core::dead_letter::{DeadLetter, DeadLetterLog};
use crate::core::dedup::{IdentityKey, MatchOn, RowIndex};
use crate::core::retry::RetryPolicy;
use crate::domain::layout::{json_to_cell, SheetRow, TIMESTAMP_COLUMN};
use crate::domain::model::LeadSubmission;
use crate::domain::ports::{LeadStore, Storage};
use crate::utils::error::{LeadError, Result};
use crate::utils::validation::require_field;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 重試用盡後要怎麼回覆呼叫端；兩種都會先寫入失敗紀錄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Report,
    Accept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Appended,
    Updated { row: usize },
    /// 只在 `FailurePolicy::Accept` 下出現
    DeadLettered { error: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub replayed: usize,
    pub remaining: usize,
}

pub struct LeadService<S: Storage> {
    store: Arc<dyn LeadStore>,
    retry: RetryPolicy,
    match_on: MatchOn,
    on_failure: FailurePolicy,
    dead_letters: Option<DeadLetterLog<S>>,
    write_lock: Mutex<()>,
}

impl<S: Storage> LeadService<S> {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
            match_on: MatchOn::default(),
            on_failure: FailurePolicy::default(),
            dead_letters: None,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_match_on(mut self, match_on: MatchOn) -> Self {
        self.match_on = match_on;
        self
    }

    pub fn with_failure_policy(mut self, on_failure: FailurePolicy) -> Self {
        self.on_failure = on_failure;
        self
    }

    pub fn with_dead_letters(mut self, log: DeadLetterLog<S>) -> Self {
        self.dead_letters = Some(log);
        self
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// `/api/submit-to-sheets`：驗證、補時間戳記後 upsert，失敗時依政策處理
    pub async fn submit(&self, mut lead: LeadSubmission) -> Result<SubmitOutcome> {
        lead.validate()?;
        lead.fill_timestamp(Utc::now());

        let result = self.retry.run("submit", || self.upsert(&lead)).await;
        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(
                    "❌ Submission for '{}' failed via {}: {}",
                    lead.email,
                    self.store.name(),
                    e
                );
                self.dead_letter(lead, &e).await;
                match self.on_failure {
                    FailurePolicy::Report => Err(e),
                    FailurePolicy::Accept => Ok(SubmitOutcome::DeadLettered {
                        error: e.to_string(),
                    }),
                }
            }
        }
    }

    async fn dead_letter(&self, lead: LeadSubmission, error: &LeadError) {
        let Some(log) = &self.dead_letters else {
            tracing::warn!("⚠️ No dead-letter log configured; submission dropped");
            return;
        };
        if let Err(e) = log.record(&DeadLetter::new(lead, error)).await {
            tracing::error!("❌ Failed to write dead letter to {}: {}", log.path(), e);
        }
    }

    /// 讀一次 -> 建索引 -> 更新或新增；同一行程內以鎖序列化
    pub async fn upsert(&self, lead: &LeadSubmission) -> Result<SubmitOutcome> {
        let _guard = self.write_lock.lock().await;
        let cells = lead.to_row();

        if !self.store.supports_reads() {
            self.store.append(&cells).await?;
            return Ok(SubmitOutcome::Appended);
        }

        let index = RowIndex::build(self.store.rows().await?, self.match_on);
        let existing = IdentityKey::for_lead(lead, self.match_on).and_then(|key| index.get(&key));

        match existing {
            Some(row) => {
                self.store.update(row, &cells).await?;
                tracing::info!("📝 Updated row {} for '{}'", row.number, lead.email);
                Ok(SubmitOutcome::Updated { row: row.number })
            }
            None => {
                self.store.append(&cells).await?;
                tracing::info!("➕ Appended new row for '{}'", lead.email);
                Ok(SubmitOutcome::Appended)
            }
        }
    }

    fn require_reads(&self, operation: &str) -> Result<()> {
        if self.store.supports_reads() {
            Ok(())
        } else {
            Err(LeadError::unsupported(self.store.name(), operation))
        }
    }

    async fn index(&self, match_on: MatchOn) -> Result<RowIndex> {
        let rows = self.retry.run("read rows", || self.store.rows()).await?;
        Ok(RowIndex::build(rows, match_on))
    }

    /// `/api/check-user`：一律以 email + phone 比對
    pub async fn user_exists(&self, email: &str, phone: &str) -> Result<bool> {
        require_field("email", email)?;
        require_field("phone", phone)?;
        self.require_reads("check-user")?;

        let index = self.index(MatchOn::EmailAndPhone).await?;
        Ok(index.find(email, phone).is_some())
    }

    /// 今天（UTC）已有紀錄者不能再玩；沒有紀錄或日期無法解析時允許
    pub async fn can_play(&self, email: &str, today: NaiveDate) -> Result<bool> {
        require_field("email", email)?;
        self.require_reads("check-play-limit")?;

        let index = self.index(MatchOn::Email).await?;
        let played_today = index
            .find(email, "")
            .and_then(played_on)
            .is_some_and(|date| date == today);
        Ok(!played_today)
    }

    /// `/api/track`：以 email 找到列後更新指定欄位；找不到列回傳 false
    pub async fn track(
        &self,
        key: &str,
        updates: &HashMap<String, serde_json::Value>,
    ) -> Result<bool> {
        require_field("key", key)?;
        self.require_reads("track")?;

        let _guard = self.write_lock.lock().await;
        let index = self.index(MatchOn::Email).await?;
        let Some(row) = index.find(key, "") else {
            tracing::debug!("🔍 No row for tracking key '{}'", key);
            return Ok(false);
        };

        let mut lead = LeadSubmission::from_row(&row.cells);
        let mut changed = false;
        for (column, value) in updates {
            if lead.set_field(column, json_to_cell(value)) {
                changed = true;
            } else {
                tracing::warn!("⚠️ Ignoring unknown tracking column '{}'", column);
            }
        }
        if !changed {
            return Ok(false);
        }

        let cells = lead.to_row();
        self.retry
            .run("track", || self.store.update(row, &cells))
            .await?;
        tracing::info!("📌 Tracked {} column(s) on row {}", updates.len(), row.number);
        Ok(true)
    }

    pub async fn rows(&self) -> Result<Vec<SheetRow>> {
        self.require_reads("export")?;
        self.retry.run("read rows", || self.store.rows()).await
    }

    /// 重送失敗紀錄；成功的移除，仍失敗的附加回檔案。重送期間新寫入的紀錄保留到下一次。
    pub async fn replay(&self) -> Result<ReplaySummary> {
        let Some(log) = &self.dead_letters else {
            return Err(LeadError::MissingConfigError {
                field: "dead_letter.path".to_string(),
            });
        };

        let letters = log.claim().await?;
        let mut remaining = Vec::new();
        let mut replayed = 0;

        for letter in letters {
            let result = self
                .retry
                .run("replay", || self.upsert(&letter.submission))
                .await;
            match result {
                Ok(_) => replayed += 1,
                Err(e) => {
                    tracing::warn!(
                        "🔁 Replay for '{}' still failing: {}",
                        letter.submission.email,
                        e
                    );
                    remaining.push(DeadLetter {
                        error: e.to_string(),
                        ..letter
                    });
                }
            }
        }

        log.release(&remaining).await?;
        Ok(ReplaySummary {
            replayed,
            remaining: remaining.len(),
        })
    }
}

/// 時間戳記欄的日期：RFC 3339、`YYYY-MM-DD` 開頭或試算表的 `M/D/YYYY`
pub fn played_on(row: &SheetRow) -> Option<NaiveDate> {
    let raw = row.cell(TIMESTAMP_COLUMN).trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc).date_naive());
    }
    if let Some(prefix) = raw.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    let date_part = raw.split_whitespace().next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%m/%d/%Y").ok()
}
