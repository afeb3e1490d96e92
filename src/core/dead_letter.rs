use crate::domain::model::{format_timestamp, LeadSubmission};
use crate::domain::ports::Storage;
use crate::utils::error::{LeadError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// 重試用盡後仍寫不進試算表的一筆資料
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub failed_at: String,
    pub error: String,
    pub submission: LeadSubmission,
}

impl DeadLetter {
    pub fn new(submission: LeadSubmission, error: &LeadError) -> Self {
        Self {
            failed_at: format_timestamp(Utc::now()),
            error: error.to_string(),
            submission,
        }
    }
}

/// JSON Lines 格式的失敗紀錄，一行一筆
pub struct DeadLetterLog<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> DeadLetterLog<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn record(&self, letter: &DeadLetter) -> Result<()> {
        let mut line = serde_json::to_vec(letter)?;
        line.push(b'\n');
        self.storage.append_file(&self.path, &line).await?;
        tracing::warn!(
            "📮 Dead-lettered submission for '{}' to {}",
            letter.submission.email,
            self.path
        );
        Ok(())
    }

    fn replaying_path(&self) -> String {
        format!("{}.replaying", self.path)
    }

    /// 檔案不存在視為空；無法解析的行略過
    pub async fn read_all(&self) -> Result<Vec<DeadLetter>> {
        self.read_path(&self.path).await
    }

    async fn read_path(&self, path: &str) -> Result<Vec<DeadLetter>> {
        let data = match self.storage.read_file(path).await {
            Ok(data) => data,
            Err(LeadError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new())
            }
            Err(e) => return Err(e),
        };

        let text = String::from_utf8_lossy(&data);
        let mut letters = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<DeadLetter>(line) {
                Ok(letter) => letters.push(letter),
                Err(e) => tracing::warn!(
                    "⚠️ Skipping malformed dead letter at {}:{}: {}",
                    path,
                    line_no + 1,
                    e
                ),
            }
        }
        Ok(letters)
    }

    /// 把目前的紀錄搬到 `<path>.replaying` 後讀出；之後寫入的紀錄落在新的檔案。
    /// 上次重送中斷留下的 `.replaying` 會先處理。
    pub async fn claim(&self) -> Result<Vec<DeadLetter>> {
        let replaying = self.replaying_path();
        match self.storage.read_file(&replaying).await {
            Ok(_) => {
                tracing::warn!("🔁 Resuming interrupted replay from {}", replaying);
            }
            Err(LeadError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                if !self.storage.rename_file(&self.path, &replaying).await? {
                    return Ok(Vec::new());
                }
            }
            Err(e) => return Err(e),
        }
        self.read_path(&replaying).await
    }

    /// 仍失敗的紀錄附加回目前的檔案，再刪掉 `.replaying`
    pub async fn release(&self, remaining: &[DeadLetter]) -> Result<()> {
        if !remaining.is_empty() {
            let mut data = Vec::new();
            for letter in remaining {
                data.extend(serde_json::to_vec(letter)?);
                data.push(b'\n');
            }
            self.storage.append_file(&self.path, &data).await?;
        }
        self.storage.remove_file(&self.replaying_path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use tempfile::TempDir;

    fn lead(email: &str) -> LeadSubmission {
        LeadSubmission {
            email: email.to_string(),
            action: "entry".to_string(),
            ..Default::default()
        }
    }

    fn unavailable() -> LeadError {
        LeadError::SheetApiError {
            status: 503,
            body: "unavailable".to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_and_read_back() {
        let dir = TempDir::new().unwrap();
        let log = DeadLetterLog::new(LocalStorage::new(dir.path()), "dead_letters.jsonl");

        log.record(&DeadLetter::new(lead("a@x.com"), &unavailable())).await.unwrap();
        log.record(&DeadLetter::new(lead("b@x.com"), &unavailable())).await.unwrap();

        let letters = log.read_all().await.unwrap();
        assert_eq!(letters.len(), 2);
        assert_eq!(letters[0].submission.email, "a@x.com");
        assert!(letters[1].error.contains("503"));
        assert!(letters[1].failed_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_missing_log_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let log = DeadLetterLog::new(LocalStorage::new(dir.path()), "none.jsonl");
        assert!(log.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let good = serde_json::to_string(&DeadLetter::new(lead("a@x.com"), &unavailable())).unwrap();
        storage
            .write_file("dl.jsonl", format!("{{broken\n\n{}\n", good).as_bytes())
            .await
            .unwrap();

        let log = DeadLetterLog::new(storage, "dl.jsonl");
        let letters = log.read_all().await.unwrap();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].submission.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_claim_moves_log_aside_and_release_keeps_new_letters() {
        let dir = TempDir::new().unwrap();
        let log = DeadLetterLog::new(LocalStorage::new(dir.path()), "dl.jsonl");
        let first = DeadLetter::new(lead("a@x.com"), &unavailable());
        let second = DeadLetter::new(lead("b@x.com"), &unavailable());
        log.record(&first).await.unwrap();
        log.record(&second).await.unwrap();

        let claimed = log.claim().await.unwrap();
        assert_eq!(claimed, vec![first.clone(), second.clone()]);
        assert!(log.read_all().await.unwrap().is_empty());

        let late = DeadLetter::new(lead("late@x.com"), &unavailable());
        log.record(&late).await.unwrap();

        log.release(&[second.clone()]).await.unwrap();
        assert_eq!(log.read_all().await.unwrap(), vec![late, second]);
        assert!(!dir.path().join("dl.jsonl.replaying").exists());
    }

    #[tokio::test]
    async fn test_claim_resumes_interrupted_replay() {
        let dir = TempDir::new().unwrap();
        let log = DeadLetterLog::new(LocalStorage::new(dir.path()), "dl.jsonl");
        let stale = DeadLetter::new(lead("stale@x.com"), &unavailable());
        log.record(&stale).await.unwrap();
        log.claim().await.unwrap();

        let fresh = DeadLetter::new(lead("fresh@x.com"), &unavailable());
        log.record(&fresh).await.unwrap();

        assert_eq!(log.claim().await.unwrap(), vec![stale]);
        log.release(&[]).await.unwrap();
        assert_eq!(log.claim().await.unwrap(), vec![fresh]);
    }

    #[tokio::test]
    async fn test_claim_without_log_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = DeadLetterLog::new(LocalStorage::new(dir.path()), "dl.jsonl");
        assert!(log.claim().await.unwrap().is_empty());
        log.release(&[]).await.unwrap();
    }
}
