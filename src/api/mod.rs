//! HTTP collaborators: the bank feed, the weather service and the Telegram
//! notification channel.
//!
//! Each collaborator hides behind a small trait so the monitor loop can be
//! driven against in-process fakes in tests, without touching the network.

mod bank;
mod telegram;
mod weather;

pub use bank::BankClient;
pub use telegram::TelegramNotifier;
pub use weather::{WeatherClient, WeatherReport};

use crate::model::TransactionHistory;
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Read access to the bank's transaction history.
#[async_trait]
pub trait BankApi: Send + Sync {
    /// Fetches the account's transaction history for an inclusive date
    /// range. Transient upstream failures come back as the typed kinds in
    /// [`crate::error::ApiError`] so the retry executor can classify them.
    async fn fetch_history(&self, from: NaiveDate, to: NaiveDate) -> Result<TransactionHistory>;
}

/// Read access to current weather conditions.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Current conditions at the configured coordinates, or `None` when the
    /// service is unavailable or unconfigured. Never an error: weather is
    /// decoration, not monitoring.
    async fn current(&self) -> Option<WeatherReport>;
}

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}
