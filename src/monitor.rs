//! The poll loop that drives everything.
//!
//! A single cooperative task ticks at a fixed interval. Each tick performs,
//! in order: console housekeeping, the daily log-rotation gate, operating-
//! hours edge detection, the periodic weather refresh, and the transaction
//! check. The ordering is a correctness requirement, not a style choice:
//! the daily summary must go out before the goodnight message, and
//! housekeeping must not interleave with the edge handling.

use crate::api::{BankApi, Notifier, WeatherApi};
use crate::error::RetriesExhausted;
use crate::messages;
use crate::model::{DailySummary, TransactionHistory, TransactionRecord};
use crate::retry::{self, with_retry};
use crate::rotate;
use crate::store::TransactionStore;
use crate::{utils, Config, Result};
use chrono::{DateTime, Local, NaiveDate};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The monitoring loop and all of its state.
///
/// Everything the loop mutates between ticks lives here rather than in
/// globals, and the collaborators sit behind traits so tests can drive
/// ticks with fakes and synthetic clock readings.
pub struct Monitor {
    config: Config,
    bank: Arc<dyn BankApi>,
    weather: Arc<dyn WeatherApi>,
    notifier: Arc<dyn Notifier>,
    store: TransactionStore,
    started_at: Instant,
    last_console_clear: Instant,
    last_weather_check: Option<Instant>,
    was_operating: bool,
    last_rotation_date: NaiveDate,
}

impl Monitor {
    pub fn new(
        config: Config,
        bank: Arc<dyn BankApi>,
        weather: Arc<dyn WeatherApi>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = TransactionStore::new(config.store_path());
        Self {
            bank,
            weather,
            notifier,
            store,
            started_at: Instant::now(),
            last_console_clear: Instant::now(),
            last_weather_check: None,
            was_operating: false,
            // Rotation is armed for tomorrow; whatever is in the logs today
            // predates this process.
            last_rotation_date: Local::now().date_naive(),
            config,
        }
    }

    /// Runs the loop until a termination signal or a fatal error.
    ///
    /// Termination is cooperative: a signal flips a flag that is observed at
    /// the top of each iteration, so the current tick always finishes its
    /// work first. On the way out (signal or fatal error) a shutdown
    /// notification goes out best-effort.
    pub async fn run(&mut self) -> Result<()> {
        let shutdown = spawn_signal_listener();

        utils::clear_console();
        let started = Local::now();
        info!("bank transaction monitor started");
        self.dispatch(&messages::startup(started)).await;
        self.was_operating = self.config.window().contains(started.time());

        let outcome = loop {
            if shutdown.load(Ordering::SeqCst) {
                break Ok(());
            }
            if let Err(e) = self.tick(Local::now()).await {
                error!("fatal error, stopping the monitor: {e:#}");
                self.dispatch(&messages::error_alert(&e, Local::now())).await;
                break Err(e);
            }
            tokio::time::sleep(self.config.tick_interval()).await;
        };

        info!("bank transaction monitor stopped");
        self.dispatch(&messages::shutdown(Local::now())).await;
        outcome
    }

    /// One pass of the loop at the given instant. Separated from [`run`] so
    /// tests can drive ticks with synthetic times.
    ///
    /// An `Err` here is fatal: the caller stops the loop.
    pub(crate) async fn tick(&mut self, now: DateTime<Local>) -> Result<()> {
        self.housekeep_console();
        self.maybe_rotate_logs(now).await;

        let operating = self.config.window().contains(now.time());
        if operating != self.was_operating {
            if operating {
                self.on_window_open().await;
            } else {
                self.on_window_close(now).await;
            }
            self.was_operating = operating;
        }

        if operating {
            self.maybe_check_weather().await;
            self.check_transactions(now).await?;
        } else {
            debug!("outside operating hours, skipping transaction check");
        }
        Ok(())
    }

    /// Clears the terminal once the configured interval has elapsed.
    fn housekeep_console(&mut self) {
        if self.last_console_clear.elapsed() < self.config.console_clear_interval() {
            return;
        }
        utils::clear_console();
        info!("console cleared, monitor still running");
        self.last_console_clear = Instant::now();
    }

    /// Runs log rotation at most once per calendar day, and only while the
    /// clock is inside the rotation window. The window is best-effort: if
    /// the process is down or busy during it, rotation skips a day.
    async fn maybe_rotate_logs(&mut self, now: DateTime<Local>) {
        if now.date_naive() <= self.last_rotation_date {
            return;
        }
        if !self.config.rotation_window_contains(now.time()) {
            return;
        }
        info!("rotation window reached, rotating log files");
        match rotate::rotate_logs(self.config.logs_dir(), now).await {
            Ok(count) => info!("log rotation complete, {count} files rotated"),
            Err(e) => warn!("log rotation failed: {e:#}"),
        }
        self.last_rotation_date = now.date_naive();
    }

    /// The off -> on edge: greet, then push an immediate weather update.
    async fn on_window_open(&mut self) {
        info!("operating hours began, sending morning greeting");
        self.dispatch(messages::GOOD_MORNING).await;

        if let Some(report) = self.weather.current().await {
            let uptime = self.uptime();
            self.dispatch(&messages::weather_report(&report, &uptime)).await;
            self.last_weather_check = Some(Instant::now());
        }
    }

    /// The on -> off edge: the daily summary first, then goodnight.
    async fn on_window_close(&mut self, now: DateTime<Local>) {
        info!("operating hours ended, sending the daily summary");
        let summary = self.daily_summary(now).await;
        self.dispatch(&messages::daily_summary(&summary)).await;
        self.dispatch(messages::GOODNIGHT).await;
    }

    /// Fetches and dispatches weather once the refresh interval has passed.
    /// The timer advances whether or not the fetch produced anything, so a
    /// failing weather endpoint is not hammered every tick.
    async fn maybe_check_weather(&mut self) {
        let due = match self.last_weather_check {
            Some(checked) => checked.elapsed() >= self.config.weather_check_interval(),
            None => true,
        };
        if !due {
            return;
        }

        debug!("refreshing weather data");
        if let Some(report) = self.weather.current().await {
            let uptime = self.uptime();
            self.dispatch(&messages::weather_report(&report, &uptime)).await;
        }
        self.last_weather_check = Some(Instant::now());
    }

    /// The transaction check: fetch today's latest transaction, compare it
    /// to the persisted one, and notify when it is new.
    ///
    /// Upstream flakiness (transient failures, exhausted retries, an empty
    /// feed) is a normal outcome and keeps the loop running. Anything else
    /// escaping this method stops the monitor.
    async fn check_transactions(&mut self, now: DateTime<Local>) -> Result<()> {
        let today = now.date_naive();
        debug!("requesting transaction data from the bank");

        let history = match self.fetch_history(today).await {
            Ok(history) => history,
            Err(e) if is_recoverable(&e) => {
                info!("bank API temporarily unavailable, will retry on next tick: {e:#}");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let Some(latest) = history.latest() else {
            debug!("no transactions recorded for today yet");
            return Ok(());
        };

        let previous = self.store.load().await;
        if !TransactionRecord::is_new(latest, previous.as_ref()) {
            debug!(ref_no = %latest.ref_no(), "no new transactions");
            return Ok(());
        }

        info!(ref_no = %latest.ref_no(), "new transaction detected");
        // Persist before dispatching: a crash in between drops one
        // notification instead of repeating it forever.
        self.store.save(latest).await?;
        self.dispatch(&messages::transaction_alert(latest, self.config.account_label()))
            .await;
        if let Ok(json) = serde_json::to_string_pretty(latest) {
            println!("{json}");
        }
        Ok(())
    }

    /// Today's transaction history through the retry executor.
    async fn fetch_history(&self, date: NaiveDate) -> Result<TransactionHistory> {
        let bank = Arc::clone(&self.bank);
        with_retry(
            || {
                let bank = Arc::clone(&bank);
                async move { bank.fetch_history(date, date).await }
            },
            self.config.retry_max_attempts(),
            self.config.retry_initial_delay(),
        )
        .await
    }

    /// The day's summary; upstream failure degrades to a zeroed summary.
    async fn daily_summary(&self, now: DateTime<Local>) -> DailySummary {
        let today = now.date_naive();
        match self.fetch_history(today).await {
            Ok(history) => history.daily_summary(today),
            Err(e) => {
                warn!("could not build the daily summary: {e:#}");
                DailySummary::empty_with_error(today, format!("{e:#}"))
            }
        }
    }

    /// Fire-and-forget delivery. Channel failures are logged and swallowed:
    /// a broken notification channel must not take down monitoring.
    async fn dispatch(&self, text: &str) {
        if let Err(e) = self.notifier.send(text).await {
            warn!("failed to deliver notification: {e:#}");
        }
    }

    fn uptime(&self) -> String {
        utils::format_runtime(self.started_at.elapsed())
    }
}

/// Transient errors and exhausted retries keep the loop alive; anything
/// else is fatal to monitoring.
fn is_recoverable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<RetriesExhausted>().is_some() || retry::is_transient(err)
}

/// Spawns a task that flips the returned flag on SIGINT or SIGTERM. Both
/// signals mean the same thing: finish the current tick, then stop.
fn spawn_signal_listener() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::clone(&flag);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("received termination signal, shutting down gracefully");
        shutdown.store(true, Ordering::SeqCst);
    });
    flag
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!("could not install the SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
