//! Daily rotation of the monitor's log files.
//!
//! The monitor appends to files in its logs directory around the clock;
//! once a day, inside a small morning window, each file's content moves to
//! a dated backup and the live file restarts with a single marker line.

use crate::{utils, Result};
use anyhow::Context;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Extension of the files subject to rotation.
const LOG_EXTENSION: &str = "log";

/// Rotates every `.log` file in `logs_dir`.
///
/// A failure on one file never blocks the others; each failure is logged
/// and the loop moves on. Returns the number of files actually rotated
/// (empty files are left alone and not counted).
pub(crate) async fn rotate_logs(logs_dir: &Path, now: DateTime<Local>) -> Result<usize> {
    let stamp = now.format("%Y%m%d").to_string();
    let mut dir = tokio::fs::read_dir(logs_dir)
        .await
        .with_context(|| format!("Unable to read the logs directory {}", logs_dir.display()))?;

    let mut log_files = Vec::new();
    while let Some(entry) = dir
        .next_entry()
        .await
        .context("Failed to read directory entry")?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == LOG_EXTENSION) {
            log_files.push(path);
        }
    }

    if log_files.is_empty() {
        info!("no log files to rotate in {}", logs_dir.display());
        return Ok(0);
    }

    let mut rotated = 0;
    for path in &log_files {
        match rotate_one(path, &stamp, now).await {
            Ok(Some(backup)) => {
                rotated += 1;
                info!("rotated {} -> {}", path.display(), backup.display());
            }
            Ok(None) => info!("skipping empty log file {}", path.display()),
            Err(e) => warn!("failed to rotate {}: {e:#}", path.display()),
        }
    }
    Ok(rotated)
}

/// Rotates a single log file. Returns the backup path, or `None` when the
/// file was empty and left alone.
async fn rotate_one(
    path: &Path,
    stamp: &str,
    now: DateTime<Local>,
) -> Result<Option<PathBuf>> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Unable to stat {}", path.display()))?;
    if metadata.len() == 0 {
        return Ok(None);
    }

    let backup = backup_path(path, stamp).await;
    let content = utils::read(path).await?;
    utils::write(&backup, content).await?;
    utils::write(
        path,
        format!("--- log rotated at {} ---\n", now.format("%Y-%m-%d %H:%M:%S")),
    )
    .await?;
    Ok(Some(backup))
}

/// Picks `{name}.{stamp}`, falling back to `{name}.{stamp}.1`, `.2`, ... so
/// a second rotation on the same day never clobbers an earlier backup.
async fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let base = PathBuf::from(format!("{}.{stamp}", path.display()));
    let mut candidate = base.clone();
    let mut suffix = 0u32;
    while tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
        suffix += 1;
        candidate = PathBuf::from(format!("{}.{suffix}", base.display()));
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn noon() -> DateTime<Local> {
        Local::now()
            .with_time(chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap())
            .unwrap()
    }

    #[tokio::test]
    async fn test_rotation_backs_up_and_truncates() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("monitor.log");
        tokio::fs::write(&log, "line one\nline two\n").await.unwrap();

        let rotated = rotate_logs(dir.path(), noon()).await.unwrap();
        assert_eq!(rotated, 1);

        let stamp = noon().format("%Y%m%d").to_string();
        let backup = dir.path().join(format!("monitor.log.{stamp}"));
        assert_eq!(
            tokio::fs::read_to_string(&backup).await.unwrap(),
            "line one\nline two\n"
        );

        let remaining = tokio::fs::read_to_string(&log).await.unwrap();
        assert!(remaining.starts_with("--- log rotated at "));
    }

    #[tokio::test]
    async fn test_same_day_rotations_never_overwrite_backups() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("monitor.log");
        let stamp = noon().format("%Y%m%d").to_string();

        tokio::fs::write(&log, "first batch\n").await.unwrap();
        rotate_logs(dir.path(), noon()).await.unwrap();

        tokio::fs::write(&log, "second batch\n").await.unwrap();
        rotate_logs(dir.path(), noon()).await.unwrap();

        let first = dir.path().join(format!("monitor.log.{stamp}"));
        let second = dir.path().join(format!("monitor.log.{stamp}.1"));
        assert_eq!(
            tokio::fs::read_to_string(&first).await.unwrap(),
            "first batch\n"
        );
        assert_eq!(
            tokio::fs::read_to_string(&second).await.unwrap(),
            "second batch\n"
        );
    }

    #[tokio::test]
    async fn test_empty_files_are_left_alone() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("quiet.log");
        tokio::fs::write(&log, "").await.unwrap();

        let rotated = rotate_logs(dir.path(), noon()).await.unwrap();
        assert_eq!(rotated, 0);

        let stamp = noon().format("%Y%m%d").to_string();
        assert!(!dir.path().join(format!("quiet.log.{stamp}")).exists());
    }

    #[tokio::test]
    async fn test_only_log_files_are_touched() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("config.json"), "{}")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("busy.log"), "data\n")
            .await
            .unwrap();

        let rotated = rotate_logs(dir.path(), noon()).await.unwrap();
        assert_eq!(rotated, 1);
        assert_eq!(
            tokio::fs::read_to_string(dir.path().join("config.json"))
                .await
                .unwrap(),
            "{}"
        );
    }
}
