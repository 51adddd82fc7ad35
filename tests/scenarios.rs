// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use iiab::{
    Aspect, Config, Controller, Direction, DwellClass, Frame, Kernel, Millis, OptionSwitches,
    Occupancy, Polarity, SignalOptions, StateKind, Status, TimeoutClass, controller::Outputs,
    timer::TICKS_PER_MS,
};
use std::collections::VecDeque;

/// Frames of one full PWM cycle.
const CYCLE_FRAMES: usize = 32;

/// Upper bound for the debounce filter to follow an input change.
const SETTLE_MS: u32 = 100;

struct Sim {
    kernel: Kernel,
    ctrl: Controller,
    cfg: Config,
    frames: VecDeque<Frame>,
    transitions: Vec<(Millis, StateKind, StateKind)>,
    last: Option<Outputs>,
}

impl Sim {
    fn new(cfg: Config) -> Self {
        Self {
            kernel: Kernel::new(),
            ctrl: Controller::new(),
            cfg,
            frames: VecDeque::new(),
            transitions: Vec::new(),
            last: None,
        }
    }

    fn now(&self) -> Millis {
        self.kernel.millis()
    }

    /// Advance by one millisecond and poll once.
    fn step(&mut self, raw: Occupancy) -> Outputs {
        for _ in 0..TICKS_PER_MS {
            let frame = self.kernel.tick();
            if self.frames.len() == CYCLE_FRAMES {
                self.frames.pop_front();
            }
            self.frames.push_back(frame);
        }
        let out = self.ctrl.poll(&self.kernel, raw, &self.cfg);
        check_invariants(&out);
        if let Some((from, to)) = out.transition {
            self.transitions.push((self.now(), from, to));
        }
        self.last = Some(out);
        out
    }

    fn run(&mut self, raw: Occupancy, ms: u32) -> Outputs {
        let mut out = self.step(raw);
        for _ in 1..ms {
            out = self.step(raw);
        }
        out
    }

    /// Run until the machine enters `kind`. Returns the time of entry.
    fn run_until(&mut self, raw: Occupancy, kind: StateKind, max_ms: u32) -> Millis {
        for _ in 0..max_ms {
            let out = self.step(raw);
            if out.state == kind && out.transition.is_some() {
                return self.now();
            }
        }
        panic!("{kind:?} not reached within {max_ms} ms, last {:?}", self.last);
    }

    fn kinds(&self) -> Vec<(StateKind, StateKind)> {
        self.transitions.iter().map(|(_, f, t)| (*f, *t)).collect()
    }

    /// Number of frames in the last PWM cycle in which the (red, green)
    /// pins of `head` were driven high.
    fn pins_high(&self, head: Direction) -> (usize, usize) {
        assert_eq!(self.frames.len(), CYCLE_FRAMES);
        let red = self.frames.iter().filter(|f| f.head(head).red).count();
        let green = self.frames.iter().filter(|f| f.head(head).green).count();
        (red, green)
    }
}

fn check_invariants(out: &Outputs) {
    let cleared = matches!(out.state, StateKind::Clearance | StateKind::Timeout);
    for head in Direction::ALL {
        if out.aspects[head.index()] == Aspect::Green {
            assert!(cleared, "{out:?}");
            assert_eq!(out.holder, Some(head), "{out:?}");
        } else {
            assert_eq!(out.aspects[head.index()], Aspect::Red, "{out:?}");
        }
    }
    assert_ne!(out.aspects, [Aspect::Green, Aspect::Green]);
}

const NONE: Occupancy = Occupancy::new(false, false, false);
const A: Occupancy = Occupancy::new(true, false, false);
const B: Occupancy = Occupancy::new(false, true, false);
const AB: Occupancy = Occupancy::new(true, true, false);
const AJ: Occupancy = Occupancy::new(true, false, true);
const BJ: Occupancy = Occupancy::new(false, true, true);
const J: Occupancy = Occupancy::new(false, false, true);

#[test]
fn test_full_passage() {
    let mut sim = Sim::new(Config::default());
    sim.run(NONE, 200);
    assert!(sim.transitions.is_empty());

    sim.run_until(A, StateKind::Clearance, SETTLE_MS + 10);
    let out = sim.run(A, 300);
    assert_eq!(out.aspects, [Aspect::Green, Aspect::Red]);
    assert_eq!(out.status, Status::Green);
    assert_eq!(sim.pins_high(Direction::A), (0, CYCLE_FRAMES));
    assert_eq!(sim.pins_high(Direction::B), (CYCLE_FRAMES, 0));

    sim.run_until(AJ, StateKind::Occupied, SETTLE_MS);
    let out = sim.run(J, 300);
    assert_eq!(out.state, StateKind::Occupied);
    assert_eq!(out.aspects, [Aspect::Red, Aspect::Red]);
    assert_eq!(sim.pins_high(Direction::A), (CYCLE_FRAMES, 0));

    let lockout_at = sim.run_until(NONE, StateKind::Lockout, SETTLE_MS);
    let remaining = sim.kernel.timers().lockout;
    assert_eq!(remaining, Millis::from_secs(15));
    assert_eq!(sim.last.map(|o| o.status), Some(Status::Blue));

    let reset_at = sim.run_until(NONE, StateKind::Reset, 16_000);
    assert_eq!(reset_at.since(lockout_at), Millis::from_secs(15));
    let idle_at = sim.run_until(NONE, StateKind::Idle, 2);
    assert_eq!(idle_at.since(reset_at), Millis(1));
    assert_eq!(sim.ctrl.lock().holder(), None);

    use StateKind::*;
    assert_eq!(
        sim.kinds(),
        [
            (Idle, Delay),
            (Delay, Request),
            (Request, Clearance),
            (Clearance, Occupied),
            (Occupied, Lockout),
            (Lockout, Reset),
            (Reset, Idle),
        ]
    );

    let out = sim.run(NONE, 1000);
    assert_eq!(out.state, StateKind::Idle);
    assert_eq!(sim.transitions.len(), 7);
}

#[test]
fn test_fixed_dwell_duration() {
    let mut sim = Sim::new(Config {
        dwell_class: DwellClass::new(3),
        ..Default::default()
    });
    let delay_at = sim.run_until(B, StateKind::Delay, SETTLE_MS);
    assert_eq!(sim.kernel.timers().delay, Millis::from_secs(15));
    let out = sim.run(B, 1000);
    assert_eq!(out.status, Status::Yellow);
    assert_eq!(out.aspects, [Aspect::Red, Aspect::Red]);
    assert_eq!(out.dwell_secs, 15);

    let request_at = sim.run_until(B, StateKind::Request, 15_000);
    assert_eq!(request_at.since(delay_at), Millis::from_secs(15));
    sim.run_until(B, StateKind::Clearance, 2);
    assert_eq!(sim.ctrl.lock().holder(), Some(Direction::B));
}

#[test]
fn test_train_stops_short() {
    let mut sim = Sim::new(Config::default());
    sim.run_until(A, StateKind::Clearance, SETTLE_MS + 10);

    // Approach clears without the junction being entered.
    sim.run_until(NONE, StateKind::Timeout, SETTLE_MS);
    assert_eq!(sim.kernel.timers().timeout, Millis::from_secs(15));
    let out = sim.run(NONE, 5000);
    assert_eq!(out.state, StateKind::Timeout);
    assert_eq!(out.status, Status::White);
    assert_eq!(out.aspects, [Aspect::Green, Aspect::Red]);

    // Train shows up again before expiry.
    sim.run_until(A, StateKind::Clearance, SETTLE_MS);
    sim.run(A, 500);

    // Gone again: the timeout starts over.
    let timeout_at = sim.run_until(NONE, StateKind::Timeout, SETTLE_MS);
    assert_eq!(sim.kernel.timers().timeout, Millis::from_secs(15));
    let reset_at = sim.run_until(NONE, StateKind::Reset, 16_000);
    assert_eq!(reset_at.since(timeout_at), Millis::from_secs(15));
    let out = sim.run(NONE, 10);
    assert_eq!(out.state, StateKind::Idle);
    assert_eq!(out.aspects, [Aspect::Red, Aspect::Red]);
    assert_eq!(sim.ctrl.lock().holder(), None);
}

#[test]
fn test_timeout_class() {
    let mut sim = Sim::new(Config {
        timeout_class: TimeoutClass::new(3),
        ..Default::default()
    });
    sim.run_until(A, StateKind::Clearance, SETTLE_MS + 10);
    let timeout_at = sim.run_until(NONE, StateKind::Timeout, SETTLE_MS);
    let reset_at = sim.run_until(NONE, StateKind::Reset, 61_000);
    assert_eq!(reset_at.since(timeout_at), Millis::from_secs(60));
}

#[test]
fn test_simultaneous_requests_a_wins() {
    let mut sim = Sim::new(Config::default());
    sim.run_until(AB, StateKind::Clearance, SETTLE_MS + 10);
    let out = sim.run(AB, 500);
    assert_eq!(out.holder, Some(Direction::A));
    assert_eq!(out.aspects, [Aspect::Green, Aspect::Red]);
    assert_eq!(sim.pins_high(Direction::B), (CYCLE_FRAMES, 0));
}

#[test]
fn test_clearing_lenient() {
    let mut sim = Sim::new(Config::default());
    sim.run_until(AB, StateKind::Clearance, SETTLE_MS + 10);
    sim.run_until(BJ, StateKind::Occupied, SETTLE_MS);
    sim.run_until(BJ, StateKind::Clearing, 2);
    let out = sim.run(BJ, 2000);
    assert_eq!(out.state, StateKind::Clearing);
    assert_eq!(out.status, Status::Purple);
    assert_eq!(out.aspects, [Aspect::Red, Aspect::Red]);

    // The waiting train backs off while the junction is still occupied.
    sim.run_until(J, StateKind::Reset, SETTLE_MS);
    sim.run_until(J, StateKind::Idle, 2);
    let out = sim.run(J, 1000);
    assert_eq!(out.state, StateKind::Idle);
    assert_eq!(sim.ctrl.lock().holder(), None);
}

#[test]
fn test_clearing_strict() {
    let mut sim = Sim::new(Config {
        strict_clearing: true,
        ..Default::default()
    });
    sim.run_until(AB, StateKind::Clearance, SETTLE_MS + 10);
    sim.run_until(BJ, StateKind::Occupied, SETTLE_MS);
    sim.run_until(BJ, StateKind::Clearing, 2);

    let out = sim.run(J, 1000);
    assert_eq!(out.state, StateKind::Clearing);
    sim.run_until(NONE, StateKind::Reset, SETTLE_MS);
    sim.run_until(NONE, StateKind::Idle, 2);
}

#[test]
fn test_request_waits_for_junction() {
    let mut sim = Sim::new(Config::default());
    sim.run_until(AJ, StateKind::Request, SETTLE_MS + 10);

    let mut yellow = 0;
    let mut off = 0;
    for _ in 0..1000 {
        let out = sim.step(AJ);
        assert_eq!(out.state, StateKind::Request);
        assert_eq!(out.aspects, [Aspect::Red, Aspect::Red]);
        match out.status {
            Status::Yellow => yellow += 1,
            Status::Off => off += 1,
            s => panic!("unexpected status {s:?}"),
        }
    }
    assert!((450..=550).contains(&yellow), "{yellow}");
    assert!((450..=550).contains(&off), "{off}");
    assert_eq!(sim.ctrl.lock().holder(), None);

    sim.run_until(A, StateKind::Clearance, SETTLE_MS);
}

#[test]
fn test_noisy_detector_is_ignored() {
    let mut sim = Sim::new(Config::default());
    for i in 0..2000 {
        // Bounces every 30 ms, never stable for 8 samples.
        let raw = if (i / 30) % 2 == 0 { A } else { NONE };
        let out = sim.step(raw);
        assert_eq!(out.state, StateKind::Idle);
    }
    assert!(sim.transitions.is_empty());
}

#[test]
fn test_common_anode_searchlight() {
    let mut sim = Sim::new(Config {
        signal: Some(SignalOptions {
            polarity: Polarity::CommonAnode,
            searchlight: true,
        }),
        ..Default::default()
    });
    sim.run(NONE, 1000);
    // Lit lamps are driven low.
    assert_eq!(sim.pins_high(Direction::A), (0, CYCLE_FRAMES));

    sim.run_until(A, StateKind::Clearance, SETTLE_MS + 10);
    let mut saw_dark = false;
    for _ in 0..2000 {
        sim.step(A);
        let (red, green) = sim.kernel.signals().duty(Direction::A);
        assert!(red == 0 || green == 0, "{red} {green}");
        saw_dark |= red == 0 && green == 0;
    }
    assert!(saw_dark);
    assert_eq!(sim.pins_high(Direction::A), (CYCLE_FRAMES, 0));
    assert_eq!(sim.pins_high(Direction::B), (0, CYCLE_FRAMES));
}

#[test]
fn test_common_anode_survives_ladder_fault() {
    let common_anode = OptionSwitches::from_bits(0x10);
    let mut sim = Sim::new(Config::from_switches(0, Some(common_anode), false));
    sim.run(NONE, 1000);
    assert_eq!(sim.pins_high(Direction::A), (0, CYCLE_FRAMES));

    // The ladder reading is lost. The firmware has no options any more.
    sim.cfg = Config::from_switches(0, None, false);
    for _ in 0..1000 {
        let out = sim.step(NONE);
        assert_eq!(out.state, StateKind::Idle);
        let frame = sim.frames.back().copied().unwrap_or_default();
        assert!(frame.driven);
        for head in Direction::ALL {
            // Green lamp dark means its pin is high.
            assert!(frame.head(head).green, "{frame:?}");
            assert!(!frame.head(head).red, "{frame:?}");
        }
    }
    assert_eq!(
        sim.kernel.signals().options().map(|o| o.polarity),
        Some(Polarity::CommonAnode)
    );

    // A different reading later does not rewire the lamps either.
    sim.cfg = Config::from_switches(0, Some(OptionSwitches::from_bits(0)), false);
    sim.run(NONE, 1000);
    assert_eq!(sim.pins_high(Direction::A), (0, CYCLE_FRAMES));
    assert_eq!(sim.pins_high(Direction::B), (0, CYCLE_FRAMES));
}

#[test]
fn test_lamps_float_until_options_read() {
    let mut sim = Sim::new(Config::from_switches(0, None, false));
    sim.run(NONE, 500);
    assert!(sim.frames.iter().all(|f| !f.driven));
    assert_eq!(sim.pins_high(Direction::A), (0, 0));

    sim.cfg = Config::from_switches(0, Some(OptionSwitches::from_bits(0)), false);
    sim.run(NONE, 100);
    assert!(sim.frames.iter().all(|f| f.driven));
    assert_eq!(sim.pins_high(Direction::A), (CYCLE_FRAMES, 0));
}

#[test]
fn test_randomized_dwell_in_range() {
    let mut sim = Sim::new(Config {
        dwell_class: DwellClass::new(4),
        randomized: true,
        ..Default::default()
    });
    sim.run(NONE, 1234);
    sim.run_until(A, StateKind::Delay, SETTLE_MS);
    let secs = sim.last.map(|o| o.dwell_secs).unwrap_or_default();
    assert!((5..=15).contains(&secs), "{secs}");
    assert_eq!(sim.kernel.timers().delay, Millis::from_secs(secs));
}

// vim: ts=4 sw=4 expandtab
