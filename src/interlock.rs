// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interlocking protection state machine.
//!
//! [State::step] is a pure transition function. It does not touch timers,
//! the lock or the signals. It returns the next state together with the one
//! [Action] that the caller has to carry out on the way.
//! [State::aspects] and [State::status] project a state to the outputs.

use crate::{Occupancy, signal::Aspect, timer::Millis};

/// An approach, and with it the signal head that protects it.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Direction {
    A,
    B,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::A, Direction::B];

    pub const fn opposite(self) -> Self {
        match self {
            Direction::A => Direction::B,
            Direction::B => Direction::A,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Interlocking state. All states except `Idle` carry the holder direction.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum State {
    /// Waiting for a train on either approach.
    #[default]
    Idle,
    /// Artificial dwell before the lock is requested.
    Delay(Direction),
    /// Waiting for the junction lock.
    Request(Direction),
    /// Lock held, signal cleared, train on the approach.
    Clearance(Direction),
    /// Lock held, signal cleared, approach became clear.
    /// The train may have stopped short of the junction.
    Timeout(Direction),
    /// Train inside the junction.
    Occupied(Direction),
    /// Junction clear again. Mandatory closed interval.
    Lockout(Direction),
    /// Junction still occupied while a train waits on the opposite approach.
    Clearing(Direction),
    /// Release the lock.
    Reset(Direction),
}

/// Fieldless mirror of [State] for reporting.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum StateKind {
    Idle,
    Delay,
    Request,
    Clearance,
    Timeout,
    Occupied,
    Lockout,
    Clearing,
    Reset,
}

/// Side effect that goes along with a transition.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Action {
    None,
    /// Compute the dwell and arm the delay timer.
    ArmDelay,
    /// Take the junction lock for the holder.
    TakeLock,
    ArmTimeout,
    ArmLockout,
    /// Release the junction lock.
    ReleaseLock,
}

/// Everything a transition may depend on.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Inputs {
    /// Debounced occupancy.
    pub occupancy: Occupancy,
    pub delay_expired: bool,
    pub timeout_expired: bool,
    /// The lockout timer is still running.
    pub lockout_active: bool,
    /// Nobody holds the junction lock.
    pub lock_free: bool,
    /// Leaving CLEARING also requires a clear junction.
    pub strict_clearing: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Step {
    pub next: State,
    pub action: Action,
}

impl Step {
    const fn stay(state: State) -> Self {
        Self {
            next: state,
            action: Action::None,
        }
    }

    const fn to(next: State) -> Self {
        Self {
            next,
            action: Action::None,
        }
    }

    const fn with(next: State, action: Action) -> Self {
        Self { next, action }
    }
}

/// Status indicator color.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[repr(u8)]
pub enum Status {
    #[default]
    Off,
    Red,
    Yellow,
    Green,
    Blue,
    Purple,
    White,
}

impl Status {
    /// (red, green, blue) channels of the indicator LED.
    pub const fn rgb(self) -> (bool, bool, bool) {
        match self {
            Status::Off => (false, false, false),
            Status::Red => (true, false, false),
            Status::Yellow => (true, true, false),
            Status::Green => (false, true, false),
            Status::Blue => (false, false, true),
            Status::Purple => (true, false, true),
            Status::White => (true, true, true),
        }
    }
}

/// Half period of the REQUEST status blinker.
const REQUEST_BLINK: Millis = Millis(250);

impl State {
    pub const fn kind(&self) -> StateKind {
        match self {
            State::Idle => StateKind::Idle,
            State::Delay(_) => StateKind::Delay,
            State::Request(_) => StateKind::Request,
            State::Clearance(_) => StateKind::Clearance,
            State::Timeout(_) => StateKind::Timeout,
            State::Occupied(_) => StateKind::Occupied,
            State::Lockout(_) => StateKind::Lockout,
            State::Clearing(_) => StateKind::Clearing,
            State::Reset(_) => StateKind::Reset,
        }
    }

    /// The direction that holds (or is about to hold) the junction.
    pub const fn holder(&self) -> Option<Direction> {
        match *self {
            State::Idle => None,
            State::Delay(dir)
            | State::Request(dir)
            | State::Clearance(dir)
            | State::Timeout(dir)
            | State::Occupied(dir)
            | State::Lockout(dir)
            | State::Clearing(dir)
            | State::Reset(dir) => Some(dir),
        }
    }

    /// Compute the transition for one poll.
    ///
    /// Guards are evaluated in priority order. The first match wins.
    pub fn step(&self, inp: &Inputs) -> Step {
        let occ = inp.occupancy;

        match *self {
            State::Idle => {
                if inp.lockout_active {
                    return Step::stay(*self);
                }
                // Approach A wins over B on simultaneous requests.
                match Direction::ALL.into_iter().find(|d| occ.approach(*d)) {
                    Some(dir) => Step::with(State::Delay(dir), Action::ArmDelay),
                    None => Step::stay(*self),
                }
            }
            State::Delay(dir) => {
                if inp.delay_expired {
                    Step::to(State::Request(dir))
                } else {
                    Step::stay(*self)
                }
            }
            State::Request(dir) => {
                if inp.lock_free && !occ.junction() {
                    Step::with(State::Clearance(dir), Action::TakeLock)
                } else {
                    Step::stay(*self)
                }
            }
            State::Clearance(dir) => {
                if occ.junction() {
                    Step::to(State::Occupied(dir))
                } else if !occ.approach(dir) {
                    Step::with(State::Timeout(dir), Action::ArmTimeout)
                } else {
                    Step::stay(*self)
                }
            }
            State::Timeout(dir) => {
                if occ.junction() {
                    Step::to(State::Occupied(dir))
                } else if occ.approach(dir) {
                    Step::to(State::Clearance(dir))
                } else if inp.timeout_expired {
                    Step::to(State::Reset(dir))
                } else {
                    Step::stay(*self)
                }
            }
            State::Occupied(dir) => {
                if !occ.junction() {
                    Step::with(State::Lockout(dir), Action::ArmLockout)
                } else if occ.approach(dir.opposite()) {
                    Step::to(State::Clearing(dir))
                } else {
                    Step::stay(*self)
                }
            }
            State::Lockout(dir) => {
                if !inp.lockout_active {
                    Step::to(State::Reset(dir))
                } else {
                    Step::stay(*self)
                }
            }
            State::Clearing(dir) => {
                let opposite_clear = !occ.approach(dir.opposite());
                let junction_ok = !inp.strict_clearing || !occ.junction();
                if opposite_clear && junction_ok {
                    Step::to(State::Reset(dir))
                } else {
                    Step::stay(*self)
                }
            }
            State::Reset(_) => Step::with(State::Idle, Action::ReleaseLock),
        }
    }

    /// Aspects of the (A, B) signal heads.
    ///
    /// Only the holder's head in CLEARANCE or TIMEOUT is cleared.
    /// Everything else shows the most restrictive aspect.
    pub const fn aspects(&self) -> [Aspect; 2] {
        match *self {
            State::Clearance(Direction::A) | State::Timeout(Direction::A) => {
                [Aspect::Green, Aspect::Red]
            }
            State::Clearance(Direction::B) | State::Timeout(Direction::B) => {
                [Aspect::Red, Aspect::Green]
            }
            _ => [Aspect::Red, Aspect::Red],
        }
    }

    pub const fn aspect(&self, head: Direction) -> Aspect {
        self.aspects()[head.index()]
    }

    /// Status indicator color at time `now`.
    pub const fn status(&self, now: Millis) -> Status {
        match self {
            State::Idle | State::Reset(_) => Status::Off,
            State::Delay(_) => Status::Yellow,
            State::Request(_) => {
                if (now.0 / REQUEST_BLINK.0) % 2 == 0 {
                    Status::Yellow
                } else {
                    Status::Off
                }
            }
            State::Clearance(_) => Status::Green,
            State::Timeout(_) => Status::White,
            State::Occupied(_) => Status::Red,
            State::Lockout(_) => Status::Blue,
            State::Clearing(_) => Status::Purple,
        }
    }
}


// vim: ts=4 sw=4 expandtab
