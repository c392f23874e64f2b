//! MSF (60 kHz, "Time from NPL") transmitter core: UK civil calendar
//! derivation, 60-second frame encoding, slew-bounded clock discipline, and
//! the timer-driven scheduler that drives a carrier output line from it.
//!
//! Board glue (Wi-Fi, SNTP transport, NVS, the bring-up shell, the status
//! LED) lives outside this crate; everything here is reached through the
//! [`hal`] traits so it runs the same against real hardware or fakes.

pub mod bcd;
pub mod calendar;
pub mod discipline;
pub mod error;
pub mod frame;
pub mod hal;
pub mod scheduler;

pub use calendar::Calendar;
pub use discipline::{Delta, TimeDiscipline};
pub use error::{AdjustError, TransmitFault};
pub use frame::{FrameEncoder, Signal};
pub use hal::{MonotonicClock, OutputLine, SyncSource, WallClock};
pub use scheduler::{Action, TransmitConfig, TransmitScheduler};
