// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::interlock::Direction;

/// Exclusive right to pass through the junction.
///
/// The controller only ever handles one junction and one pending direction,
/// so a single holder slot is all the mutual exclusion needed.
#[derive(Default, Debug)]
pub struct JunctionLock {
    holder: Option<Direction>,
}

impl JunctionLock {
    pub const fn new() -> Self {
        Self { holder: None }
    }

    /// Try to take the lock for `dir`.
    ///
    /// Fails if the lock is already held or the junction is occupied.
    pub fn request(&mut self, dir: Direction, junction_occupied: bool) -> bool {
        if self.holder.is_some() || junction_occupied {
            return false;
        }
        self.holder = Some(dir);
        true
    }

    pub fn clear(&mut self) {
        self.holder = None;
    }

    pub fn holder(&self) -> Option<Direction> {
        self.holder
    }

    pub fn is_locked(&self) -> bool {
        self.holder.is_some()
    }
}


// vim: ts=4 sw=4 expandtab
