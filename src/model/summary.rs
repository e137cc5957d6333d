//! Daily aggregation of the transaction feed.

use crate::model::TransactionHistory;
use chrono::NaiveDate;
use serde::Serialize;

/// Totals for one calendar day of transactions.
///
/// Building a summary never fails the caller: an empty feed or an upstream
/// error produces a zeroed summary, with the error message carried along for
/// the notification text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub(crate) date: String,
    pub(crate) total_credit: i64,
    pub(crate) transaction_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

impl DailySummary {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date: format_summary_date(date),
            ..Self::default()
        }
    }

    pub fn empty_with_error(date: NaiveDate, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(date)
        }
    }

    pub fn total_credit(&self) -> i64 {
        self.total_credit
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }
}

impl TransactionHistory {
    /// Sums the day's credit amounts, counting unknown amounts as zero.
    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        DailySummary {
            date: format_summary_date(date),
            total_credit: self
                .records()
                .iter()
                .map(|r| r.credit_amount().or_zero())
                .sum(),
            transaction_count: self.records().len(),
            error: None,
        }
    }
}

/// `dd-mm-yyyy`, the date format used in the summary notification.
fn format_summary_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, TransactionRecord};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    fn record_with_amount(amount: Amount) -> TransactionRecord {
        serde_json::from_value(serde_json::json!({
            "refNo": "FT1",
            "transactionDate": "01/06/2026 09:00:00",
            "creditAmount": amount,
        }))
        .unwrap()
    }

    #[test]
    fn test_empty_history_sums_to_zero() {
        let summary = TransactionHistory::default().daily_summary(day());
        assert_eq!(summary.total_credit(), 0);
        assert_eq!(summary.transaction_count(), 0);
        assert_eq!(summary.date, "01-06-2026");
    }

    #[test]
    fn test_unknown_amounts_count_as_zero() {
        let history = TransactionHistory {
            transaction_history_list: vec![
                record_with_amount(Amount::new(1_000)),
                record_with_amount(Amount::new(2_000)),
                record_with_amount(Amount::unknown()),
            ],
        };
        let summary = history.daily_summary(day());
        assert_eq!(summary.total_credit(), 3_000);
        assert_eq!(summary.transaction_count(), 3);
    }

    #[test]
    fn test_error_annotation() {
        let summary = DailySummary::empty_with_error(day(), "bank unreachable");
        assert_eq!(summary.total_credit(), 0);
        assert_eq!(summary.error.as_deref(), Some("bank unreachable"));
    }
}
