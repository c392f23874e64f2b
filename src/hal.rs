//! The hardware/network boundary.
//!
//! Three small traits stand in for the board's timer, RTC, and GPIO, the
//! same way `embedded-hal`'s `OutputPin` stands in for a real pin: the
//! scheduler and the clock discipline are written entirely against these
//! traits, so they are host-testable with fakes and a real board only has
//! to provide three thin impls plus the SNTP glue described below.

/// A strictly non-decreasing microsecond counter since boot.
pub trait MonotonicClock {
    fn now_us(&self) -> u64;
}

/// The host wall clock: Unix microseconds, which may jump (steps) or be
/// nudged smoothly (slews, via [`crate::discipline::TimeDiscipline::adjust`]).
pub trait WallClock {
    fn now_us(&self) -> u64;

    /// Overwrite the wall clock. Only ever called from
    /// [`crate::discipline::TimeDiscipline::adjust`].
    fn set_us(&self, us: u64);
}

/// The single digital output line the carrier is keyed on.
///
/// Implementations resolve polarity (active-low vs. active-high) themselves;
/// [`crate::scheduler::TransmitScheduler`] only ever reasons in the logical
/// carrier-on/carrier-off domain.
pub trait OutputLine {
    /// Carrier on.
    fn set_active(&self);
    /// Carrier off.
    fn set_inactive(&self);
}

/// Not a trait the scheduler consumes directly: this is the call shape the
/// SNTP glue uses to drive [`crate::discipline::TimeDiscipline`]. A real
/// board registers a closure over an `Arc<TimeDiscipline>` with its SNTP
/// client's sync callback that calls
/// `discipline.sync_reported(monotonic_clock.now_us())` directly, rather
/// than recovering a `TimeDiscipline` pointer from a C-style `void*`.
pub type SyncSource = dyn Fn(u64) + Send + Sync;
