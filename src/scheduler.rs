//! The transmission event loop: a single-threaded, timer-driven state
//! machine that turns wall-clock time into carrier edges.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::discipline::TimeDiscipline;
use crate::error::TransmitFault;
use crate::frame::FrameEncoder;
use crate::hal::{MonotonicClock, OutputLine, WallClock};

const SECOND_US: i64 = 1_000_000;
const MS: i64 = 1_000;

/// What the caller must do after an [`TransmitScheduler::event`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Re-arm the one-shot timer this many microseconds from now; the next
    /// firing produces an edge (or a new frame).
    ArmAt(Duration),
    /// Nothing can be done right now; check back after this delay.
    Retry(Duration),
}

/// Static configuration. Output-pin identity and polarity live in the
/// `OutputLine` impl itself; only the bring-up delay is plain data here.
#[derive(Debug, Clone, Copy)]
pub struct TransmitConfig {
    /// Delay before the very first `event()` call, giving the network
    /// stack a chance to land at least one sync.
    pub bootstrap_delay: Duration,
}

impl Default for TransmitConfig {
    fn default() -> Self {
        TransmitConfig {
            bootstrap_delay: Duration::from_secs(1),
        }
    }
}

/// Owns the three hardware collaborators plus a shared clock discipline,
/// and drives the output line one edge at a time.
pub struct TransmitScheduler<M, W, O> {
    monotonic: M,
    wall: W,
    line: O,
    discipline: Arc<TimeDiscipline>,
    config: TransmitConfig,
    current: Option<FrameEncoder>,
    last_signal_s: i64,
    last_edge_us: AtomicU64,
}

impl<M, W, O> TransmitScheduler<M, W, O>
where
    M: MonotonicClock,
    W: WallClock,
    O: OutputLine,
{
    pub fn new(monotonic: M, wall: W, line: O, discipline: Arc<TimeDiscipline>, config: TransmitConfig) -> Self {
        TransmitScheduler {
            monotonic,
            wall,
            line,
            discipline,
            config,
            current: None,
            last_signal_s: i64::MIN,
            last_edge_us: AtomicU64::new(0),
        }
    }

    pub fn bootstrap_delay(&self) -> Duration {
        self.config.bootstrap_delay
    }

    /// Monotonic uptime of the most recently emitted edge, for the liveness
    /// indicator. Safe to call concurrently with `event()`.
    pub fn last_edge_us(&self) -> u64 {
        self.last_edge_us.load(Ordering::Acquire)
    }

    /// Run one dispatch: build a frame, emit an edge, or decide there is
    /// nothing to do yet. Never blocks.
    pub fn event(&mut self) -> Action {
        loop {
            let uptime_us = self.monotonic.now_us();
            let Some(uptime) = to_i64(uptime_us) else {
                log::error!("monotonic uptime {uptime_us} overflows i64");
                self.line.set_active();
                return Action::Retry(TransmitFault::ArithmeticInvariantViolated.retry_delay());
            };

            match self.current.take() {
                None => match self.build_next(uptime_us, uptime) {
                    Ok(frame) => {
                        self.current = Some(frame);
                        continue;
                    }
                    Err(action) => return action,
                },
                Some(mut frame) => match frame.peek() {
                    None => return Action::Retry(TransmitFault::FrameDrainedEmpty.retry_delay()),
                    Some(edge) => {
                        if uptime < edge.ts_us {
                            self.current = Some(frame);
                            return Action::ArmAt(duration_from(edge.ts_us, uptime));
                        }
                        self.set_line(edge.carrier);
                        self.last_edge_us.store(uptime_us, Ordering::Release);
                        frame.pop();
                        self.current = Some(frame);
                        continue;
                    }
                },
            }
        }
    }

    fn set_line(&self, carrier_on: bool) {
        if carrier_on {
            self.line.set_active();
        } else {
            self.line.set_inactive();
        }
    }

    fn build_next(&mut self, uptime_us: u64, uptime: i64) -> Result<FrameEncoder, Action> {
        if !self.discipline.sync_fresh(uptime_us) {
            log::info!("waiting for fresh time sync");
            self.line.set_active();
            return Err(Action::Retry(TransmitFault::SyncNotFresh.retry_delay()));
        }

        let wall_us = self.wall.now_us();
        let Some(wall) = to_i64(wall_us) else {
            log::error!("wall clock {wall_us} overflows i64");
            self.line.set_active();
            return Err(Action::Retry(TransmitFault::ArithmeticInvariantViolated.retry_delay()));
        };
        if wall < uptime {
            log::error!("wall clock ({wall_us}) behind uptime ({uptime_us})");
            self.line.set_active();
            return Err(Action::Retry(TransmitFault::WallBehindUptime.retry_delay()));
        }

        let offset_us = wall - uptime;
        let wall_s = wall / SECOND_US;
        // At least one full minute of transmit lead time past the next
        // minute boundary: always two minutes past the start of the
        // current wall minute, via plain flooring with no special case
        // for an already-aligned wall_s.
        let next_s = (wall_s / 60 + 2) * 60;

        if next_s == self.last_signal_s {
            let target = next_s * SECOND_US - 700 * MS - offset_us;
            return Err(Action::ArmAt(duration_from(target, uptime)));
        }

        let mut frame = FrameEncoder::new(next_s, offset_us);
        self.last_signal_s = next_s;
        frame.drop_past(uptime);
        if frame.is_empty() {
            return Err(Action::Retry(TransmitFault::FrameDrainedEmpty.retry_delay()));
        }

        log::info!("{} (offset {offset_us}us)", frame.calendar());
        self.discipline.grant_slew();
        Ok(frame)
    }
}

fn to_i64(v: u64) -> Option<i64> {
    i64::try_from(v).ok()
}

fn duration_from(target_us: i64, now_us: i64) -> Duration {
    let delta = target_us.saturating_sub(now_us).max(0);
    Duration::from_micros(delta as u64)
}
