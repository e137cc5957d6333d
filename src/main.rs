use bankwatch::args::Args;
use bankwatch::{BankClient, Config, Monitor, Result, TelegramNotifier, WeatherClient};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// The monitor's own log file, subject to the daily rotation.
const LOG_FILE: &str = "bankwatch.log";

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    let logs_dir = Config::logs_dir_for(args.common().home().path());
    let _log_guard = init_logger(log_level, &logs_dir);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn main_inner(args: Args) -> Result<()> {
    let config = Config::load_or_init(args.common().home().path()).await?;

    let bank = BankClient::new(&config, args.username(), args.password())?;
    let weather = WeatherClient::new(&config)?;
    let notifier = TelegramNotifier::new(&config)?;

    let mut monitor = Monitor::new(
        config,
        Arc::new(bank),
        Arc::new(weather),
        Arc::new(notifier),
    );
    monitor.run().await
}

/// Initializes the tracing subscriber: human-readable output on stderr plus
/// a persistent copy in the logs directory, which the monitor rotates daily.
/// The returned guard must stay alive for the file writer to flush.
fn init_logger(level: LevelFilter, logs_dir: &Path) -> Option<WorkerGuard> {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        }
    };

    match std::fs::create_dir_all(logs_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(logs_dir, LOG_FILE);
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(fmt::layer().with_ansi(false).with_writer(file_writer))
                .init();
            Some(guard)
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            warn!(
                "file logging disabled, cannot create {}: {e}",
                logs_dir.display()
            );
            None
        }
    }
}
