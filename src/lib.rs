// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interlocking-In-A-Box control kernel.
//!
//! The kernel protects a single-track junction that is fed by two approaches.
//! It is split into two halves that match the two execution contexts of the
//! target:
//!
//! - [Kernel] is driven by the periodic timer interrupt ([Kernel::tick]).
//!   It owns the millisecond timebase, the countdown timers and the
//!   software PWM of the signal heads.
//! - [Controller] is owned by the main loop ([Controller::poll]).
//!   It owns the debounce filter, the junction lock, the dwell generator
//!   and the interlocking state machine.
//!
//! All state that crosses between the two halves lives in [TickCell]s.

#![no_std]

pub mod config;
pub mod controller;
pub mod debounce;
pub mod dwell;
pub mod interlock;
pub mod lock;
pub mod signal;
pub mod tickcell;
pub mod timer;

pub use crate::{
    config::{Config, DwellClass, OptionSwitches, Polarity, TimeoutClass},
    controller::{Controller, Kernel, Outputs},
    interlock::{Direction, State, StateKind, Status},
    signal::{Aspect, Frame, Lamps, SignalOptions},
    tickcell::TickCell,
    timer::Millis,
};

/// Debounced (or raw) occupancy of the three monitored track sections.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Occupancy(u8);

impl Occupancy {
    pub const APPROACH_A: u8 = 1 << 0;
    pub const APPROACH_B: u8 = 1 << 1;
    pub const JUNCTION: u8 = 1 << 2;
    const MASK: u8 = Self::APPROACH_A | Self::APPROACH_B | Self::JUNCTION;

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    pub const fn new(approach_a: bool, approach_b: bool, junction: bool) -> Self {
        Self(
            (approach_a as u8) * Self::APPROACH_A
                | (approach_b as u8) * Self::APPROACH_B
                | (junction as u8) * Self::JUNCTION,
        )
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn approach(self, dir: Direction) -> bool {
        let mask = match dir {
            Direction::A => Self::APPROACH_A,
            Direction::B => Self::APPROACH_B,
        };
        self.0 & mask != 0
    }

    pub const fn junction(self) -> bool {
        self.0 & Self::JUNCTION != 0
    }
}

// vim: ts=4 sw=4 expandtab
