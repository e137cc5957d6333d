//! Configuration handling for bankwatch.
//!
//! Configuration lives at `$BANKWATCH_HOME/config.json`. The first run
//! creates the home directory, the logs directory and a default config file;
//! the bank endpoint and the channel credentials must then be filled in.
//! Secrets can be supplied through the environment instead of the file,
//! which takes precedence: `BANKWATCH_TELEGRAM_TOKEN`,
//! `BANKWATCH_TELEGRAM_CHAT` and `BANKWATCH_WEATHER_KEY`.

use crate::hours::OperatingWindow;
use crate::{utils, Result};
use anyhow::{ensure, Context};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "bankwatch";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const LOGS: &str = "logs";
const LAST_TRANSACTION_JSON: &str = "last_transaction.json";

const ENV_TELEGRAM_TOKEN: &str = "BANKWATCH_TELEGRAM_TOKEN";
const ENV_TELEGRAM_CHAT: &str = "BANKWATCH_TELEGRAM_CHAT";
const ENV_WEATHER_KEY: &str = "BANKWATCH_WEATHER_KEY";

/// The `Config` object represents the configuration of the app. You
/// instantiate it by providing the path to `$BANKWATCH_HOME`; from there it
/// loads (or creates) `$BANKWATCH_HOME/config.json` and provides paths to
/// the other files the monitor owns inside the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    logs_dir: PathBuf,
    store_path: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    window: OperatingWindow,
    rotation_start: NaiveTime,
    rotation_end: NaiveTime,
}

impl Config {
    /// Loads the configuration under `home`, creating the directory, the
    /// logs directory and a default `config.json` on first run.
    pub async fn load_or_init(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the bankwatch home directory")?;
        let root = tokio::fs::canonicalize(&maybe_relative)
            .await
            .with_context(|| {
                format!(
                    "Unable to resolve the home directory {}",
                    maybe_relative.display()
                )
            })?;

        let logs_dir = Self::logs_dir_for(&root);
        utils::make_dir(&logs_dir).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = if config_path.is_file() {
            ConfigFile::load(&config_path).await?
        } else {
            let defaults = ConfigFile::default();
            defaults.save(&config_path).await?;
            tracing::info!("wrote a default configuration to {}", config_path.display());
            defaults
        };

        let window = OperatingWindow::new(
            parse_time(&config_file.operating_start)?,
            parse_time(&config_file.operating_end)?,
        )?;
        let rotation_start = parse_time(&config_file.rotation_start)?;
        let rotation_end = parse_time(&config_file.rotation_end)?;
        ensure!(
            rotation_start < rotation_end,
            "rotation window start {rotation_start} is not before its end {rotation_end}"
        );
        ensure!(
            config_file.tick_interval_secs > 0,
            "tick_interval_secs must be positive"
        );
        ensure!(
            config_file.retry_max_attempts > 0,
            "retry_max_attempts must be positive"
        );

        Ok(Self {
            store_path: root.join(LAST_TRANSACTION_JSON),
            logs_dir,
            config_path,
            config_file,
            window,
            rotation_start,
            rotation_end,
            root,
        })
    }

    /// The logs directory that belongs to a given home directory. Exposed
    /// separately because the logger is initialized before the config loads.
    pub fn logs_dir_for(home: &Path) -> PathBuf {
        home.join(LOGS)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Where the last notified transaction is persisted.
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn window(&self) -> OperatingWindow {
        self.window
    }

    /// Whether `time` falls inside the daily log-rotation window
    /// (inclusive start, exclusive end).
    pub fn rotation_window_contains(&self, time: NaiveTime) -> bool {
        self.rotation_start <= time && time < self.rotation_end
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.config_file.tick_interval_secs)
    }

    pub fn console_clear_interval(&self) -> Duration {
        Duration::from_secs(self.config_file.console_clear_interval_secs)
    }

    pub fn weather_check_interval(&self) -> Duration {
        Duration::from_secs(self.config_file.weather_check_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.request_timeout_secs)
    }

    pub fn retry_max_attempts(&self) -> u32 {
        self.config_file.retry_max_attempts
    }

    pub fn retry_initial_delay(&self) -> Duration {
        Duration::from_secs(self.config_file.retry_initial_delay_secs)
    }

    pub fn bank_api_url(&self) -> &str {
        &self.config_file.bank_api_url
    }

    /// Free-form account description shown in transaction notifications.
    pub fn account_label(&self) -> &str {
        &self.config_file.account_label
    }

    pub fn weather_api_url(&self) -> &str {
        &self.config_file.weather_api_url
    }

    pub fn weather_coordinates(&self) -> &str {
        &self.config_file.weather_coordinates
    }

    /// The bot token, preferring the environment over the config file.
    pub fn telegram_bot_token(&self) -> Option<String> {
        env_or(
            ENV_TELEGRAM_TOKEN,
            self.config_file.telegram_bot_token.as_deref(),
        )
    }

    /// The chat id, preferring the environment over the config file.
    pub fn telegram_chat_id(&self) -> Option<String> {
        env_or(
            ENV_TELEGRAM_CHAT,
            self.config_file.telegram_chat_id.as_deref(),
        )
    }

    /// The weather API key, preferring the environment over the config file.
    pub fn weather_api_key(&self) -> Option<String> {
        env_or(
            ENV_WEATHER_KEY,
            self.config_file.weather_api_key.as_deref(),
        )
    }
}

/// Reads `var` from the environment, falling back to the config file value.
fn env_or(var: &str, fallback: Option<&str>) -> Option<String> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => fallback.map(str::to_string),
    }
}

/// Parses a time-of-day setting such as `"07:30"`.
fn parse_time(text: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .with_context(|| format!("Invalid time-of-day '{text}', expected HH:MM"))
}

/// Represents the serialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "bankwatch",
///   "config_version": 1,
///   "bank_api_url": "https://api.example-bank.test",
///   "account_label": "0123456789 (Example Bank)",
///   "telegram_bot_token": "123456:ABC...",
///   "telegram_chat_id": "-1001234567890",
///   "weather_coordinates": "21.03,105.85",
///   "operating_start": "07:30",
///   "operating_end": "22:30"
/// }
/// ```
///
/// Every field has a default, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    /// Application name, should always be "bankwatch".
    app_name: String,

    /// Configuration file version.
    config_version: u8,

    /// Base URL of the bank's transaction-history API.
    bank_api_url: String,

    /// Account description shown in notifications, e.g. the account number.
    account_label: String,

    /// Telegram bot token; `BANKWATCH_TELEGRAM_TOKEN` overrides this.
    #[serde(skip_serializing_if = "Option::is_none")]
    telegram_bot_token: Option<String>,

    /// Telegram chat id; `BANKWATCH_TELEGRAM_CHAT` overrides this.
    #[serde(skip_serializing_if = "Option::is_none")]
    telegram_chat_id: Option<String>,

    /// Base URL of the weather current-conditions endpoint.
    weather_api_url: String,

    /// Weather API key; `BANKWATCH_WEATHER_KEY` overrides this.
    #[serde(skip_serializing_if = "Option::is_none")]
    weather_api_key: Option<String>,

    /// Coordinates passed to the weather service, `"lat,lon"`.
    weather_coordinates: String,

    /// Start of the daily operating window, `HH:MM`, inclusive.
    operating_start: String,

    /// End of the daily operating window, `HH:MM`, inclusive.
    operating_end: String,

    /// Start of the daily log-rotation window, `HH:MM`, inclusive.
    rotation_start: String,

    /// End of the daily log-rotation window, `HH:MM`, exclusive.
    rotation_end: String,

    /// Seconds between poll ticks.
    tick_interval_secs: u64,

    /// Seconds between console clears.
    console_clear_interval_secs: u64,

    /// Seconds between weather updates while operating.
    weather_check_interval_secs: u64,

    /// Maximum invocations per bank call, including the first.
    retry_max_attempts: u32,

    /// Backoff before the first retry; doubles after each one.
    retry_initial_delay_secs: u64,

    /// Per-request timeout for all HTTP calls.
    request_timeout_secs: u64,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            bank_api_url: String::new(),
            account_label: String::new(),
            telegram_bot_token: None,
            telegram_chat_id: None,
            weather_api_url: "https://api.weatherapi.com/v1/current.json".to_string(),
            weather_api_key: None,
            weather_coordinates: "21.03,105.85".to_string(),
            operating_start: "07:30".to_string(),
            operating_end: "22:30".to_string(),
            rotation_start: "07:30".to_string(),
            rotation_end: "07:35".to_string(),
            tick_interval_secs: 10,
            console_clear_interval_secs: 300,
            weather_check_interval_secs: 5_400,
            retry_max_attempts: 3,
            retry_initial_delay_secs: 5,
            request_timeout_secs: 15,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_first_run_creates_home_and_defaults() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("bankwatch_home");

        let config = Config::load_or_init(&home).await.unwrap();

        assert!(config.config_path().is_file());
        assert!(config.logs_dir().is_dir());
        assert_eq!(config.tick_interval(), Duration::from_secs(10));
        assert_eq!(config.retry_max_attempts(), 3);
        assert!(config.bank_api_url().is_empty());
    }

    #[tokio::test]
    async fn test_reload_reads_back_what_was_written() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");

        let first = Config::load_or_init(&home).await.unwrap();
        let second = Config::load_or_init(&home).await.unwrap();
        assert_eq!(first.config_file, second.config_file);
    }

    #[tokio::test]
    async fn test_partial_config_file_gets_defaults() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        tokio::fs::create_dir_all(&home).await.unwrap();
        tokio::fs::write(
            home.join(CONFIG_JSON),
            r#"{"bank_api_url": "https://bank.test", "tick_interval_secs": 30}"#,
        )
        .await
        .unwrap();

        let config = Config::load_or_init(&home).await.unwrap();
        assert_eq!(config.bank_api_url(), "https://bank.test");
        assert_eq!(config.tick_interval(), Duration::from_secs(30));
        assert_eq!(config.weather_check_interval(), Duration::from_secs(5_400));
    }

    #[tokio::test]
    async fn test_wrong_app_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        tokio::fs::create_dir_all(&home).await.unwrap();
        tokio::fs::write(home.join(CONFIG_JSON), r#"{"app_name": "other"}"#)
            .await
            .unwrap();

        let result = Config::load_or_init(&home).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_midnight_crossing_operating_window_is_rejected() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        tokio::fs::create_dir_all(&home).await.unwrap();
        tokio::fs::write(
            home.join(CONFIG_JSON),
            r#"{"operating_start": "22:00", "operating_end": "06:00"}"#,
        )
        .await
        .unwrap();

        assert!(Config::load_or_init(&home).await.is_err());
    }

    #[tokio::test]
    async fn test_rotation_window_bounds() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_init(dir.path().join("home")).await.unwrap();

        let t = |h, m, s| NaiveTime::from_hms_opt(h, m, s).unwrap();
        assert!(!config.rotation_window_contains(t(7, 29, 59)));
        assert!(config.rotation_window_contains(t(7, 30, 0)));
        assert!(config.rotation_window_contains(t(7, 34, 59)));
        assert!(!config.rotation_window_contains(t(7, 35, 0)));
    }

    #[test]
    fn test_env_or_prefers_the_environment() {
        let var = "BANKWATCH_TEST_ENV_OR_UNIQUE";
        assert_eq!(env_or(var, Some("fallback")).as_deref(), Some("fallback"));
        assert_eq!(env_or(var, None), None);

        std::env::set_var(var, "from-env");
        assert_eq!(env_or(var, Some("fallback")).as_deref(), Some("from-env"));
        std::env::remove_var(var);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(
            parse_time("07:30").unwrap(),
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time("22:30:15").unwrap(),
            NaiveTime::from_hms_opt(22, 30, 15).unwrap()
        );
        assert!(parse_time("half past seven").is_err());
    }
}
