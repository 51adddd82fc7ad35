// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::hw::interrupt::Mutex;
use core::cell::Cell;

/// Values that are kept in RAM for inspection with a debugger.
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Debug {
    State,
    Holder,
    Occupancy,
    DwellSecs,
    Options,
    MinStack,
}
const NRVALUES: usize = 6;

#[unsafe(no_mangle)]
static DEBUG_VALUES: Mutex<[Cell<u16>; NRVALUES]> = Mutex::new([
    Cell::new(0),
    Cell::new(0),
    Cell::new(0),
    Cell::new(0),
    Cell::new(0),
    Cell::new(0),
]);

impl Debug {
    #[allow(unused_variables)]
    pub fn log_u16(&self, value: u16) {
        #[cfg(feature = "debug")]
        crate::hw::interrupt::free(|cs| {
            let id = *self as usize;
            let values = DEBUG_VALUES.borrow(cs);
            if id < values.len() {
                values[id].set(value);
            }
        });
    }

    pub fn log_u8(&self, value: u8) {
        self.log_u16(value.into())
    }
}

// vim: ts=4 sw=4 expandtab
