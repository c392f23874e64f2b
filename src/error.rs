//! Error types for the clock-discipline and scheduler boundary.

use std::time::Duration;

/// Returned by [`crate::discipline::TimeDiscipline::adjust`], matching the
/// POSIX `adjtime(2)` contract at the single rejection point this firmware
/// implements.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AdjustError {
    /// `delta` carried a nonzero `seconds` field, a `micros` field outside
    /// `[-750_000, 750_000)`, or this was the very first call ever made,
    /// any of which the discipline must refuse so the SNTP client cannot
    /// step the clock through this path.
    #[error("adjust delta rejected: invalid argument (EINVAL)")]
    InvalidDelta,
}

/// Internal, never-propagated conditions the scheduler logs and degrades
/// from. Exposed for tests and logging call sites, not for callers to match
/// on as a `Result`: `TransmitScheduler::event` never returns `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitFault {
    /// No sync has ever been reported, or the last one is stale.
    SyncNotFresh,
    /// The wall clock read back before the monotonic clock (impossible
    /// under normal SNTP operation, but observed on some boot sequences).
    WallBehindUptime,
    /// A scheduling computation would have produced a deadline at or
    /// before `now`; treated the same as not-ready rather than panicking.
    ArithmeticInvariantViolated,
    /// The freshly built frame had nothing left to transmit after past
    /// edges were dropped.
    FrameDrainedEmpty,
}

impl TransmitFault {
    /// The retry delay the scheduler arms when this fault occurs.
    pub fn retry_delay(self) -> Duration {
        Duration::from_secs(1)
    }
}
