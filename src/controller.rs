// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    Occupancy,
    config::Config,
    debounce::Debounce,
    dwell::DwellGenerator,
    interlock::{Action, Direction, Inputs, State, StateKind, Status, Step},
    lock::JunctionLock,
    signal::{Aspect, Frame, SignalOptions, Signals},
    timer::{Millis, Timebase, Timers},
};

/// The interrupt side of the controller.
///
/// Everything in here is reached through `&self`,
/// so it can live in a `static` that the tick interrupt shares
/// with the main loop.
pub struct Kernel {
    timebase: Timebase,
    signals: Signals,
}

impl Kernel {
    pub const fn new() -> Self {
        Self {
            timebase: Timebase::new(),
            signals: Signals::new(),
        }
    }

    /// Run one tick.
    ///
    /// Must be called at [crate::timer::TICK_HZ].
    /// Returns the lamp pin levels to apply now.
    pub fn tick(&self) -> Frame {
        critical_section::with(|cs| {
            let frame = self.signals.tick_cs(cs);
            self.timebase.tick_cs(cs);
            frame
        })
    }

    pub fn millis(&self) -> Millis {
        self.timebase.millis()
    }

    pub fn timers(&self) -> Timers {
        self.timebase.snapshot()
    }

    pub fn set_aspect(&self, head: Direction, aspect: Aspect, flashing: bool) {
        self.signals.set_aspect(head, aspect, flashing);
    }

    /// Set the lamp wiring. Only the first call has an effect.
    pub fn latch_signal_options(&self, options: SignalOptions) {
        self.signals.latch_options(options);
    }

    pub fn timebase(&self) -> &Timebase {
        &self.timebase
    }

    pub fn signals(&self) -> &Signals {
        &self.signals
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one [Controller::poll].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Outputs {
    /// Aspects of the (A, B) heads.
    pub aspects: [Aspect; 2],
    pub state: StateKind,
    pub status: Status,
    pub holder: Option<Direction>,
    /// Debounced occupancy that the step was based on.
    pub occupancy: Occupancy,
    /// `(from, to)`, if the state changed in this poll.
    pub transition: Option<(StateKind, StateKind)>,
    /// Dwell of the most recent request, in seconds.
    pub dwell_secs: u16,
}

/// The main loop side of the controller.
pub struct Controller {
    inputs: Debounce,
    lock: JunctionLock,
    state: State,
    dwell: DwellGenerator,
    dwell_secs: u16,
}

impl Controller {
    pub const fn new() -> Self {
        Self {
            inputs: Debounce::new(),
            lock: JunctionLock::new(),
            state: State::Idle,
            dwell: DwellGenerator::new(),
            dwell_secs: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn lock(&self) -> &JunctionLock {
        &self.lock
    }

    /// Run one main loop pass.
    ///
    /// `raw` is the undebounced occupancy as read from the detectors.
    pub fn poll(&mut self, kernel: &Kernel, raw: Occupancy, config: &Config) -> Outputs {
        let now = kernel.millis();

        self.inputs.update(now, raw.bits());
        let occupancy = Occupancy::from_bits(self.inputs.read());

        if let Some(options) = config.signal {
            kernel.latch_signal_options(options);
        }

        let timers = kernel.timers();
        let inputs = Inputs {
            occupancy,
            delay_expired: timers.delay.is_zero(),
            timeout_expired: timers.timeout.is_zero(),
            lockout_active: !timers.lockout.is_zero(),
            lock_free: !self.lock.is_locked(),
            strict_clearing: config.strict_clearing,
        };

        let prev = self.state;
        let step = prev.step(&inputs);
        if self.apply(kernel, &step, occupancy, config, now) {
            self.state = step.next;
        }
        let state = self.state;

        let aspects = state.aspects();
        for head in Direction::ALL {
            kernel.set_aspect(head, aspects[head.index()], false);
        }

        Outputs {
            aspects,
            state: state.kind(),
            status: state.status(now),
            holder: state.holder(),
            occupancy,
            transition: (state != prev).then_some((prev.kind(), state.kind())),
            dwell_secs: self.dwell_secs,
        }
    }

    /// Carry out the side effect of a step.
    ///
    /// Returns false, if the step must not be taken.
    fn apply(
        &mut self,
        kernel: &Kernel,
        step: &Step,
        occupancy: Occupancy,
        config: &Config,
        now: Millis,
    ) -> bool {
        let timebase = kernel.timebase();
        match step.action {
            Action::None => true,
            Action::ArmDelay => {
                self.dwell_secs = self
                    .dwell
                    .compute_delay(config.dwell_class, config.randomized, now);
                timebase.delay.arm(Millis::from_secs(self.dwell_secs));
                true
            }
            Action::TakeLock => match step.next.holder() {
                Some(dir) => self.lock.request(dir, occupancy.junction()),
                None => false,
            },
            Action::ArmTimeout => {
                timebase.timeout.arm(config.timeout());
                true
            }
            Action::ArmLockout => {
                timebase.lockout.arm(config.lockout());
                true
            }
            Action::ReleaseLock => {
                self.lock.clear();
                true
            }
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}


// vim: ts=4 sw=4 expandtab
