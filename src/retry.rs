//! Bounded exponential-backoff retry for flaky upstream calls.

use crate::error::{ApiError, RetriesExhausted};
use crate::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Substrings that mark an untyped error as transient. The typed [`ApiError`]
/// kinds are checked first; this list is the fallback for errors that bubble
/// up from lower layers as plain text.
const TRANSIENT_MARKERS: [&str; 4] = ["503", "timeout", "connection", "content type"];

/// True when `err` is worth another attempt.
pub(crate) fn is_transient(err: &anyhow::Error) -> bool {
    if let Some(api) = err.downcast_ref::<ApiError>() {
        return api.is_transient();
    }
    let text = format!("{err:#}").to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Runs `operation` until it succeeds, fails non-transiently, or
/// `max_attempts` transient failures have occurred.
///
/// The delay before each retry starts at `initial_delay` and doubles after
/// every transient failure. Non-transient errors propagate unchanged after a
/// single invocation. When the final attempt also fails transiently, the
/// error comes back wrapped in [`RetriesExhausted`].
pub(crate) async fn with_retry<T, F, Fut>(
    mut operation: F,
    max_attempts: u32,
    initial_delay: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = initial_delay;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) => {
                if attempt >= max_attempts {
                    return Err(err.context(RetriesExhausted { attempts: attempt }));
                }
                warn!(
                    "transient upstream failure (attempt {attempt}/{max_attempts}), \
                     retrying in {delay:?}: {err:#}"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(err) => return Err(err),
        }
    }
}
