// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{debug::Debug, system::reset_system};
use avr_atomic::AvrAtomic;
use avr_stack::estimate_unused_stack_space;

/// Minimum amount of CPU stack space that must be free all the time.
/// Immediate reset, if less stack space is free.
const MIN_STACK_SPACE: u16 = 32;

static ANALOG_FAILURE: AvrAtomic<bool> = AvrAtomic::new();

/// Check the health of the system.
///
/// A stack overflow is not recoverable. Reset into the all-RED state.
pub fn mon_check() {
    let unused_stack_bytes = estimate_unused_stack_space();
    Debug::MinStack.log_u16(unused_stack_bytes);
    if unused_stack_bytes < MIN_STACK_SPACE {
        reset_system();
    }
}

/// The option ladder could not be decoded.
///
/// This is sticky until the next reset.
pub fn mon_report_analog_failure() {
    ANALOG_FAILURE.store(true);
}

pub fn mon_analog_failure() -> bool {
    ANALOG_FAILURE.load()
}

// vim: ts=4 sw=4 expandtab
