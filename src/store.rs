//! Persistence for the last transaction the monitor has notified about.

use crate::model::TransactionRecord;
use crate::{utils, Result};
use anyhow::Context;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Stores the single most recent notified transaction as a JSON file.
///
/// The file is overwritten wholesale on every new transaction, via a
/// temporary file and a rename so a crash mid-write cannot leave a torn
/// record behind. A missing or unreadable file simply means "no previous
/// transaction": the next poll treats whatever it sees as new.
#[derive(Debug, Clone)]
pub struct TransactionStore {
    path: PathBuf,
}

impl TransactionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Option<TransactionRecord> {
        let content = match utils::read(&self.path).await {
            Ok(content) => content,
            Err(_) => {
                debug!("no previous transaction on record at {}", self.path.display());
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    "ignoring unreadable last-transaction file {}: {e}",
                    self.path.display()
                );
                None
            }
        }
    }

    pub async fn save(&self, record: &TransactionRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)
            .context("Unable to serialize the transaction record")?;
        let tmp = self.path.with_extension("tmp");
        utils::write(&tmp, json).await?;
        utils::rename(&tmp, &self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use tempfile::TempDir;

    fn record(ref_no: &str) -> TransactionRecord {
        TransactionRecord {
            posting_date: "01/06/2026 09:00:05".to_string(),
            transaction_date: "01/06/2026 09:00:00".to_string(),
            credit_amount: Amount::new(50_000),
            description: "lunch".to_string(),
            ref_no: ref_no.to_string(),
            transaction_type: "ACSM".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_means_no_previous_transaction() {
        let dir = TempDir::new().unwrap();
        let store = TransactionStore::new(dir.path().join("last_transaction.json"));
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = TransactionStore::new(dir.path().join("last_transaction.json"));

        store.save(&record("FT001")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), record("FT001"));

        // Overwrites, never appends.
        store.save(&record("FT002")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), record("FT002"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_transaction.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = TransactionStore::new(path);
        assert!(store.load().await.is_none());
    }
}
