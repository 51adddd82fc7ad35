// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::tickcell::TickCell;
use critical_section::CriticalSection;

/// Frequency of the periodic tick.
pub const TICK_HZ: u32 = 4000;
/// Number of ticks per millisecond.
pub const TICKS_PER_MS: u8 = (TICK_HZ / 1000) as u8;

/// A point in time or a duration, in milliseconds.
///
/// Points in time wrap around after about 49 days.
/// Use [Millis::since] to compute wrap-safe distances.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Debug)]
pub struct Millis(pub u32);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    #[inline]
    pub const fn from_secs(secs: u16) -> Self {
        Self(secs as u32 * 1000)
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Time elapsed from `earlier` to `self`.
    #[inline]
    pub const fn since(self, earlier: Millis) -> Millis {
        Millis(self.0.wrapping_sub(earlier.0))
    }
}

/// A millisecond countdown.
///
/// Armed from the main loop, decremented by the tick,
/// clamped at zero. A countdown that is never armed stays at zero.
pub struct Countdown {
    remaining: TickCell<u32>,
}

impl Countdown {
    pub const fn new() -> Self {
        Self {
            remaining: TickCell::new(0),
        }
    }

    pub fn arm(&self, duration: Millis) {
        self.remaining.set(duration.0);
    }

    pub fn remaining(&self) -> Millis {
        Millis(self.remaining.get())
    }

    fn remaining_cs(&self, cs: CriticalSection<'_>) -> Millis {
        Millis(self.remaining.get_cs(cs))
    }

    #[inline]
    fn count_down_cs(&self, cs: CriticalSection<'_>) {
        self.remaining.update_cs(cs, |r| r.saturating_sub(1));
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Consistent snapshot of all countdowns, taken in one critical section.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Timers {
    pub delay: Millis,
    pub timeout: Millis,
    pub lockout: Millis,
}

pub struct Timebase {
    now: TickCell<u32>,
    sub_ms: TickCell<u8>,
    pub delay: Countdown,
    pub timeout: Countdown,
    pub lockout: Countdown,
}

impl Timebase {
    pub const fn new() -> Self {
        Self {
            now: TickCell::new(0),
            sub_ms: TickCell::new(0),
            delay: Countdown::new(),
            timeout: Countdown::new(),
            lockout: Countdown::new(),
        }
    }

    /// Current time since start.
    pub fn millis(&self) -> Millis {
        Millis(self.now.get())
    }

    pub fn snapshot(&self) -> Timers {
        critical_section::with(|cs| Timers {
            delay: self.delay.remaining_cs(cs),
            timeout: self.timeout.remaining_cs(cs),
            lockout: self.lockout.remaining_cs(cs),
        })
    }

    /// Account one tick.
    ///
    /// Returns true, if a millisecond boundary was crossed.
    pub fn tick_cs(&self, cs: CriticalSection<'_>) -> bool {
        let sub_ms = self.sub_ms.get_cs(cs) + 1;
        if sub_ms < TICKS_PER_MS {
            self.sub_ms.set_cs(cs, sub_ms);
            return false;
        }
        self.sub_ms.set_cs(cs, 0);

        self.now.update_cs(cs, |now| now.wrapping_add(1));
        self.delay.count_down_cs(cs);
        self.timeout.count_down_cs(cs);
        self.lockout.count_down_cs(cs);
        true
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Self::new()
    }
}


// vim: ts=4 sw=4 expandtab
