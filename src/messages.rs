//! Notification text for the Telegram channel.
//!
//! Telegram's MarkdownV2 dialect requires a fixed set of punctuation to be
//! backslash-escaped in ordinary text; everything upstream-supplied goes
//! through [`escape_markdown`] before being embedded in a message.

use crate::api::WeatherReport;
use crate::model::{Amount, DailySummary, TransactionRecord};
use chrono::{DateTime, Local};

/// The characters MarkdownV2 reserves.
const RESERVED: [char; 18] = [
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Timestamp format used in lifecycle messages.
const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) const GOOD_MORNING: &str = "🌞 *Good morning, have a great day\\!* 🌞";
pub(crate) const GOODNIGHT: &str = "😴 *Operating hours are over, see you tomorrow\\!* 💤";

pub(crate) fn startup(at: DateTime<Local>) -> String {
    escape_markdown(&format!(
        "🚀 Bank transaction monitor started at {}",
        at.format(TIMESTAMP)
    ))
}

pub(crate) fn shutdown(at: DateTime<Local>) -> String {
    escape_markdown(&format!(
        "🛑 Bank transaction monitor stopped at {}",
        at.format(TIMESTAMP)
    ))
}

pub(crate) fn error_alert(err: &anyhow::Error, at: DateTime<Local>) -> String {
    format!(
        "❌ *ERROR* ❌\n\n{}\n\nMonitoring stopped at {}",
        escape_markdown(&format!("{err:#}")),
        escape_markdown(&at.format(TIMESTAMP).to_string()),
    )
}

pub(crate) fn transaction_alert(record: &TransactionRecord, account_label: &str) -> String {
    format!(
        "💰 *INCOMING TRANSACTION* 💰\n\n\
         💸 Amount: *{amount}*\n\n\
         🏦 Account: {account}\n\n\
         📝 Description: {description}\n\n\
         🔢 Reference: {ref_no}\n\n\
         ⏱ Received at: *{date}*",
        amount = escape_markdown(&record.credit_amount().to_string()),
        account = escape_markdown(account_label),
        description = escape_markdown(&record.description),
        ref_no = escape_markdown(record.ref_no()),
        date = escape_markdown(record.transaction_date()),
    )
}

pub(crate) fn daily_summary(summary: &DailySummary) -> String {
    let date = escape_markdown(&summary.date);
    if summary.transaction_count() == 0 {
        format!(
            "📊 *DAILY TRANSACTION SUMMARY* 📊\n\n\
             📅 Date: *{date}*\n\n\
             💬 No transactions today\\."
        )
    } else {
        format!(
            "📊 *DAILY TRANSACTION SUMMARY* 📊\n\n\
             📅 Date: *{date}*\n\n\
             🧮 Transactions: *{count}*\n\n\
             💵 Total received: *{total}*",
            count = summary.transaction_count(),
            total = escape_markdown(&Amount::new(summary.total_credit()).to_string()),
        )
    }
}

pub(crate) fn weather_report(report: &WeatherReport, uptime: &str) -> String {
    let emoji = condition_emoji(&report.current.condition.text);
    format!(
        "🛰️ *WEATHER UPDATE* 🛰️\n\n\
         📍 Location: *{location}, {country}*\n\n\
         {emoji} Conditions: *{conditions}*\n\n\
         🌡 Temperature: *{temp}°C*\n\n\
         🌡 Feels like: *{feels}°C*\n\n\
         🕒 Updated: {updated}\n\n\
         ⏱️ Monitor uptime: *{uptime}*",
        location = escape_markdown(&report.location.name),
        country = escape_markdown(&report.location.country),
        conditions = escape_markdown(&report.current.condition.text),
        temp = escape_markdown(&report.current.temp_c.to_string()),
        feels = escape_markdown(&report.current.feelslike_c.to_string()),
        updated = escape_markdown(&report.current.last_updated),
        uptime = escape_markdown(uptime),
    )
}

/// Rough mapping from the service's condition text to an emoji.
fn condition_emoji(condition: &str) -> &'static str {
    let condition = condition.to_lowercase();
    if condition.contains("sunny") || condition.contains("clear") {
        "☀️"
    } else if condition.contains("partly cloudy") {
        "⛅"
    } else if condition.contains("cloudy") || condition.contains("overcast") {
        "☁️"
    } else if condition.contains("rain") || condition.contains("drizzle") {
        "🌧"
    } else if condition.contains("thunder") || condition.contains("lightning") {
        "⛈"
    } else if condition.contains("snow") {
        "❄️"
    } else if condition.contains("fog") || condition.contains("mist") {
        "🌫"
    } else {
        "🌤"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_escape_markdown_escapes_every_reserved_character() {
        for c in RESERVED {
            let escaped = escape_markdown(&c.to_string());
            assert_eq!(escaped, format!("\\{c}"));
        }
    }

    #[test]
    fn test_escape_markdown_leaves_plain_text_alone() {
        assert_eq!(escape_markdown("FT26152000001"), "FT26152000001");
        assert_eq!(
            escape_markdown("transfer 01.06"),
            "transfer 01\\.06"
        );
    }

    #[test]
    fn test_transaction_alert_contains_the_essentials() {
        let record: TransactionRecord = serde_json::from_value(serde_json::json!({
            "refNo": "FT26152000001",
            "transactionDate": "01/06/2026 09:00:00",
            "creditAmount": 250000,
            "description": "coffee repayment",
        }))
        .unwrap();

        let text = transaction_alert(&record, "0123456789");
        assert!(text.contains("FT26152000001"));
        assert!(text.contains("250,000 VND"));
        assert!(text.contains("coffee repayment"));
        assert!(text.contains("0123456789"));
    }

    #[test]
    fn test_summary_wording_depends_on_count() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

        let quiet = daily_summary(&DailySummary::empty(date));
        assert!(quiet.contains("No transactions today"));

        let busy = DailySummary {
            date: "01-06-2026".to_string(),
            total_credit: 3_000,
            transaction_count: 2,
            error: None,
        };
        let text = daily_summary(&busy);
        assert!(text.contains("*2*"));
        assert!(text.contains("3,000 VND"));
    }

    #[test]
    fn test_condition_emoji() {
        assert_eq!(condition_emoji("Sunny"), "☀️");
        assert_eq!(condition_emoji("Partly cloudy"), "⛅");
        assert_eq!(condition_emoji("Light rain"), "🌧");
        assert_eq!(condition_emoji("Volcanic ash"), "🌤");
    }
}
