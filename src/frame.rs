//! Packing one UK civil minute into the 60-second MSF frame and the exact
//! sequence of carrier edges a transmitter must produce for it.

use std::collections::VecDeque;

use crate::bcd::{odd_parity, set_bcd};
use crate::calendar::Calendar;

/// One microsecond-timestamped carrier transition, in the monotonic uptime
/// domain. `carrier = true` means "on".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub ts_us: i64,
    pub carrier: bool,
}

/// A fully-encoded 60-second MSF minute: the two 60-bit data planes plus the
/// ordered edge queue derived from them.
///
/// `edges` is non-decreasing in `ts_us` by construction and is meant to be
/// drained front-to-back; nothing after construction ever reorders it.
pub struct FrameEncoder {
    calendar: Calendar,
    bit_a: [bool; 60],
    bit_b: [bool; 60],
    edges: VecDeque<Signal>,
}

const MS: i64 = 1_000;
const SECOND_US: i64 = 1_000_000;

impl FrameEncoder {
    /// Encode the minute labelled `utc_time_secs` (must be a multiple of 60)
    /// for transmission, given the wall-clock-to-uptime `offset_us` in force
    /// when the frame was scheduled.
    pub fn new(utc_time_secs: i64, offset_us: i64) -> Self {
        debug_assert_eq!(utc_time_secs.rem_euclid(60), 0);

        let calendar = Calendar::new(utc_time_secs);
        let mut bit_a = [false; 60];
        let mut bit_b = [false; 60];

        set_bcd(&mut bit_a, 17, 24, calendar.year() as u32 % 100);
        set_bcd(&mut bit_a, 25, 29, calendar.month() as u32);
        set_bcd(&mut bit_a, 30, 35, calendar.day() as u32);
        set_bcd(&mut bit_a, 36, 38, calendar.weekday() as u32);
        set_bcd(&mut bit_a, 39, 44, calendar.hour() as u32);
        set_bcd(&mut bit_a, 45, 51, calendar.minute() as u32);

        // Minute identifier: 0111_1110 over bits 52..59, i.e. bits 53..58 set.
        for bit in &mut bit_a[53..=58] {
            *bit = true;
        }

        bit_b[53] = calendar.summer_change_soon();
        bit_b[58] = calendar.summer();
        bit_b[54] = odd_parity(&bit_a, 17, 24);
        bit_b[55] = odd_parity(&bit_a, 25, 35);
        bit_b[56] = odd_parity(&bit_a, 36, 38);
        bit_b[57] = odd_parity(&bit_a, 39, 51);

        let edges = build_edges(calendar.utc_time(), offset_us, &bit_a, &bit_b);

        FrameEncoder {
            calendar,
            bit_a,
            bit_b,
            edges,
        }
    }

    /// The calendar this frame was built for (for diagnostics).
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn bit_a(&self) -> &[bool; 60] {
        &self.bit_a
    }

    pub fn bit_b(&self) -> &[bool; 60] {
        &self.bit_b
    }

    /// True once every edge has been popped.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Look at the next unpopped edge without removing it.
    pub fn peek(&self) -> Option<Signal> {
        self.edges.front().copied()
    }

    /// Remove and return the next edge.
    pub fn pop(&mut self) -> Option<Signal> {
        self.edges.pop_front()
    }

    /// Drop every edge strictly before `now_us`; used by the scheduler when
    /// a frame is constructed mid-minute so only edges the main dispatch
    /// loop would still execute remain.
    pub fn drop_past(&mut self, now_us: i64) {
        while let Some(edge) = self.edges.front() {
            if edge.ts_us < now_us {
                self.edges.pop_front();
            } else {
                break;
            }
        }
    }
}

fn build_edges(
    utc_time_secs: i64,
    offset_us: i64,
    bit_a: &[bool; 60],
    bit_b: &[bool; 60],
) -> VecDeque<Signal> {
    let mut edges = VecDeque::with_capacity(64 * 3);
    // Transmit one minute before the labelled minute.
    let mut ts = utc_time_secs * SECOND_US - offset_us - 60 * SECOND_US;

    // Minute marker.
    edges.push_back(Signal {
        ts_us: ts,
        carrier: false,
    });
    ts += 500 * MS;
    edges.push_back(Signal {
        ts_us: ts,
        carrier: true,
    });
    ts += 500 * MS;

    for i in 1..=59usize {
        edges.push_back(Signal {
            ts_us: ts,
            carrier: false,
        });
        ts += 100 * MS;

        if !bit_a[i] {
            edges.push_back(Signal {
                ts_us: ts,
                carrier: true,
            });
        }
        ts += 100 * MS;

        if bit_b[i] != bit_a[i] {
            edges.push_back(Signal {
                ts_us: ts,
                carrier: !bit_b[i],
            });
        }
        ts += 100 * MS;

        if bit_b[i] {
            edges.push_back(Signal {
                ts_us: ts,
                carrier: true,
            });
        }
        ts += 700 * MS;
    }

    edges
}
