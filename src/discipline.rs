//! Slew-bounded wall-clock discipline: the `adjtime`-equivalent hook the
//! scheduler and SNTP client drive.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::error::AdjustError;
use crate::hal::WallClock;

const THREE_HOURS_US: u64 = 3 * 3600 * 1_000_000;
const MAX_SLEW_US: i32 = 25_000;
const MAX_STEP_US: i32 = 750_000;

/// An `adjtime`-style adjustment request: apply `seconds`/`micros` smoothly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub seconds: i64,
    pub micros: i32,
}

/// Process-wide, thread-shared clock discipline state.
///
/// Every field is a plain atomic so the type can be shared by reference
/// (typically behind an `Arc`) across the timer dispatch context, the SNTP
/// callback context, and the host's adjust-hook caller, without a mutex.
#[derive(Debug, Default)]
pub struct TimeDiscipline {
    time_sync_us: AtomicU64,
    slew_budget: AtomicU64,
    slew_consumed: AtomicU64,
    first_step_done: AtomicBool,
}

impl TimeDiscipline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the SNTP client (or any other sync source) completed a
    /// sync at monotonic uptime `now_us`.
    pub fn sync_reported(&self, now_us: u64) {
        self.time_sync_us.store(now_us, Ordering::Release);
        log::info!("time sync reported ({now_us}us uptime)");
    }

    /// True iff a sync has ever landed and it is less than three hours old.
    pub fn sync_fresh(&self, now_us: u64) -> bool {
        let last = self.time_sync_us.load(Ordering::Acquire);
        last > 0 && now_us.saturating_sub(last) < THREE_HOURS_US
    }

    /// Grant one slew permission. Called exactly once per frame the
    /// scheduler successfully builds.
    pub fn grant_slew(&self) {
        self.slew_budget.fetch_add(1, Ordering::Relaxed);
    }

    /// Permissions granted but not yet consumed by an accepted adjustment.
    pub fn slew_budget(&self) -> u64 {
        self.slew_budget.load(Ordering::Relaxed)
    }

    /// Permissions already consumed.
    pub fn slew_consumed(&self) -> u64 {
        self.slew_consumed.load(Ordering::Relaxed)
    }

    /// The `adjtime`-equivalent entry point. `delta = None` is a pure query
    /// and always succeeds without touching any state. `delta = Some(_)` is
    /// subject to the full contract: reject coarse steps and the very first
    /// call outright, then rate-limit accepted slews to one per granted
    /// permission and one clamped 25ms adjustment each.
    pub fn adjust<W: WallClock>(
        &self,
        delta: Option<Delta>,
        wall: &W,
    ) -> Result<Duration, AdjustError> {
        let Some(delta) = delta else {
            return Ok(Duration::ZERO);
        };

        let first_call = !self.first_step_done.swap(true, Ordering::Relaxed);
        let in_range = (-MAX_STEP_US..MAX_STEP_US).contains(&delta.micros);
        if delta.seconds != 0 || !in_range || first_call {
            log::warn!("rejecting adjust({delta:?}), first_call={first_call}");
            return Err(AdjustError::InvalidDelta);
        }

        let budget = self.slew_budget.load(Ordering::Relaxed);
        let consumed = self.slew_consumed.load(Ordering::Relaxed);
        if consumed >= budget {
            log::debug!("adjust({delta:?}) accepted but no slew permission available");
            return Ok(Duration::ZERO);
        }
        self.slew_consumed.fetch_add(1, Ordering::Relaxed);

        if delta.micros != 0 {
            let clamped = delta.micros.clamp(-MAX_SLEW_US, MAX_SLEW_US);
            let now_us = wall.now_us() as i64;
            let adjusted = (now_us + clamped as i64).max(0) as u64;
            wall.set_us(adjusted);
            log::debug!("slewed wall clock by {clamped}us");
        }

        Ok(Duration::ZERO)
    }
}
