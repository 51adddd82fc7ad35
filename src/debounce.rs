// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::timer::Millis;

/// Minimum distance between two accepted samples.
pub const SAMPLE_INTERVAL: Millis = Millis(10);

/// Per-bit input debouncer with a sample history of `DEPTH` entries.
///
/// An output bit follows its input bit only after all `DEPTH` most recent
/// samples agree. Otherwise it keeps its previous value.
/// Bits are filtered independently of each other.
pub struct Debounce<const DEPTH: usize = 8> {
    hist: [u8; DEPTH],
    next: usize,
    state: u8,
    last_sample: Option<Millis>,
}

impl<const DEPTH: usize> Debounce<DEPTH> {
    pub const fn new() -> Self {
        Self {
            hist: [0; DEPTH],
            next: 0,
            state: 0,
            last_sample: None,
        }
    }

    /// Feed a raw sample.
    ///
    /// The sample is dropped if the previous accepted sample
    /// is younger than [SAMPLE_INTERVAL].
    /// Returns true, if the sample was accepted.
    pub fn update(&mut self, now: Millis, raw: u8) -> bool {
        if let Some(last) = self.last_sample
            && now.since(last) < SAMPLE_INTERVAL
        {
            return false;
        }
        self.last_sample = Some(now);

        self.hist[self.next] = raw;
        self.next = (self.next + 1) % DEPTH;

        let all_set = self.hist.iter().fold(0xFF, |acc, s| acc & s);
        let any_set = self.hist.iter().fold(0x00, |acc, s| acc | s);
        self.state = all_set | (self.state & any_set);
        true
    }

    /// The stable (debounced) bits.
    pub fn read(&self) -> u8 {
        self.state
    }
}

impl<const DEPTH: usize> Default for Debounce<DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}


// vim: ts=4 sw=4 expandtab
