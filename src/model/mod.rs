//! Types that represent the bank's transaction data.
mod amount;
mod summary;
mod transaction;

pub use amount::Amount;
pub use summary::DailySummary;
pub use transaction::{TransactionHistory, TransactionRecord};
