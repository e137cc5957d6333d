//! The transaction record and the new-transaction decision.

use crate::model::Amount;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

fn not_available() -> String {
    "N/A".to_string()
}

/// A single row from the bank's transaction history feed.
///
/// `ref_no` together with `transaction_date` identifies a transaction; the
/// remaining fields are informational. Serialized field names follow the
/// wire format (`refNo`, `transactionDate`, ...), which is also the format
/// of the persisted last-transaction file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default = "not_available")]
    pub(crate) posting_date: String,
    #[serde(default = "not_available")]
    pub(crate) transaction_date: String,
    #[serde(default)]
    pub(crate) credit_amount: Amount,
    #[serde(default = "not_available")]
    pub(crate) description: String,
    #[serde(default = "not_available")]
    pub(crate) ref_no: String,
    #[serde(default = "not_available")]
    pub(crate) transaction_type: String,
}

impl TransactionRecord {
    pub fn ref_no(&self) -> &str {
        &self.ref_no
    }

    pub fn transaction_date(&self) -> &str {
        &self.transaction_date
    }

    pub fn credit_amount(&self) -> Amount {
        self.credit_amount
    }

    /// Decides whether `current` has not been seen before.
    ///
    /// A missing previous record always counts as new. Otherwise the
    /// reference number and the transaction date are compared independently:
    /// a difference in either one signals a new transaction.
    pub fn is_new(current: &TransactionRecord, previous: Option<&TransactionRecord>) -> bool {
        let Some(previous) = previous else {
            return true;
        };
        current.ref_no != previous.ref_no
            || current.transaction_date != previous.transaction_date
    }

    /// The transaction timestamp, when the feed's date format is parseable.
    fn transaction_time(&self) -> Option<NaiveDateTime> {
        parse_feed_datetime(&self.transaction_date)
    }
}

/// The bank's transaction history response for a date range.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHistory {
    #[serde(default)]
    pub(crate) transaction_history_list: Vec<TransactionRecord>,
}

impl TransactionHistory {
    pub fn records(&self) -> &[TransactionRecord] {
        &self.transaction_history_list
    }

    /// The most recent transaction in the response.
    ///
    /// The feed is documented to be ordered newest-first, but nothing
    /// guarantees that. When the timestamps parse, the maximum timestamp
    /// wins; when none of them do, the first element is taken as the feed's
    /// own idea of "latest". Ties keep the earlier list position.
    pub fn latest(&self) -> Option<&TransactionRecord> {
        let list = &self.transaction_history_list;
        if list.iter().all(|r| r.transaction_time().is_none()) {
            return list.first();
        }
        list.iter()
            .enumerate()
            .max_by_key(|(ix, r)| (r.transaction_time(), Reverse(*ix)))
            .map(|(_, r)| r)
    }
}

/// Parses the feed's `dd/mm/yyyy hh:mm:ss` timestamps, with an ISO-ish
/// fallback that some statement exports use.
fn parse_feed_datetime(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 2] = ["%d/%m/%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ref_no: &str, date: &str) -> TransactionRecord {
        TransactionRecord {
            posting_date: date.to_string(),
            transaction_date: date.to_string(),
            credit_amount: Amount::new(100_000),
            description: "test payment".to_string(),
            ref_no: ref_no.to_string(),
            transaction_type: "ACSM".to_string(),
        }
    }

    #[test]
    fn test_first_run_is_always_new() {
        let a = record("FT001", "01/06/2026 09:00:00");
        assert!(TransactionRecord::is_new(&a, None));
    }

    #[test]
    fn test_exact_match_is_not_new() {
        let a = record("FT001", "01/06/2026 09:00:00");
        assert!(!TransactionRecord::is_new(&a, Some(&a)));
    }

    #[test]
    fn test_either_identity_field_signals_novelty() {
        let previous = record("FT001", "01/06/2026 09:00:00");

        let new_ref = record("FT002", "01/06/2026 09:00:00");
        assert!(TransactionRecord::is_new(&new_ref, Some(&previous)));

        let new_date = record("FT001", "01/06/2026 10:30:00");
        assert!(TransactionRecord::is_new(&new_date, Some(&previous)));
    }

    #[test]
    fn test_latest_ignores_feed_order_when_timestamps_parse() {
        let history = TransactionHistory {
            transaction_history_list: vec![
                record("FT001", "01/06/2026 08:00:00"),
                record("FT003", "01/06/2026 11:45:00"),
                record("FT002", "01/06/2026 09:30:00"),
            ],
        };
        assert_eq!(history.latest().unwrap().ref_no(), "FT003");
    }

    #[test]
    fn test_latest_falls_back_to_first_element() {
        let history = TransactionHistory {
            transaction_history_list: vec![
                record("FT009", "today, early"),
                record("FT008", "yesterday-ish"),
            ],
        };
        assert_eq!(history.latest().unwrap().ref_no(), "FT009");
    }

    #[test]
    fn test_latest_of_empty_history() {
        assert!(TransactionHistory::default().latest().is_none());
    }

    #[test]
    fn test_wire_format_round_trip() {
        let json = r#"{
            "postingDate": "01/06/2026 09:00:05",
            "transactionDate": "01/06/2026 09:00:00",
            "creditAmount": "250000",
            "description": "coffee repayment",
            "refNo": "FT26152000001",
            "transactionType": "ACSM"
        }"#;
        let parsed: TransactionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.ref_no(), "FT26152000001");
        assert_eq!(parsed.credit_amount().value(), Some(250_000));

        let out = serde_json::to_string(&parsed).unwrap();
        assert!(out.contains("refNo"));
        assert!(out.contains("transactionDate"));
    }

    #[test]
    fn test_missing_fields_default_to_not_available() {
        let parsed: TransactionRecord = serde_json::from_str(r#"{"refNo": "FT1"}"#).unwrap();
        assert_eq!(parsed.transaction_date(), "N/A");
        assert_eq!(parsed.credit_amount().value(), None);
    }
}
