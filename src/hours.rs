//! The operating-hours oracle.

use crate::Result;
use anyhow::ensure;
use chrono::NaiveTime;

/// A daily time-of-day window during which the monitor actively polls.
///
/// Both ends are inclusive and only the time of day is compared, so the
/// window never depends on the calendar date. Windows that would cross
/// midnight (`end < start`) are rejected when the configuration is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl OperatingWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        ensure!(
            start <= end,
            "operating window start {start} is after its end {end}; \
             midnight-crossing windows are not supported"
        );
        Ok(Self { start, end })
    }

    /// Whether `time` falls inside the window, inclusive on both ends.
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}
