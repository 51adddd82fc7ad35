// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Signal head aspect driver.
//!
//! Each head has a red and a green lamp. The lamps are dimmed with a software
//! PWM that runs in the tick: one tick is one PWM frame and [PWM_LEVELS]
//! frames form one PWM cycle. The frame phase is shared by all heads.
//!
//! Once per PWM cycle the fade position of every lamp steps towards the
//! position requested by the target aspect. The fade position is mapped to
//! the PWM duty through a gamma-like curve, so fades look linear to the eye.
//!
//! The main loop only writes the target aspect. Fade positions and duties
//! belong to the tick.
//!
//! The lamp wiring is latched once with [Signals::latch_options]. Until then
//! the tick outputs undriven frames, because the pin level of a dark lamp is
//! not known yet.

use crate::{config::Polarity, interlock::Direction, tickcell::TickCell};
use critical_section::CriticalSection;
use curveipo::Curve;

/// Number of PWM frames per PWM cycle.
pub const PWM_LEVELS: u8 = 32;
/// Highest fade position.
pub const FADE_MAX: u8 = 31;
/// Fade position step per PWM cycle for incandescent heads.
pub const FADE_STEP: u8 = 4;
/// Fade position step per PWM cycle for searchlight heads.
pub const SEARCHLIGHT_STEP: u8 = 2;
/// Number of PWM cycles between two flasher toggles (about 0.5 s).
pub const FLASH_CYCLES: u8 = 62;

pub const HEADS: usize = 2;
const CHANNELS: usize = 2;
const RED: usize = 0;
const GREEN: usize = 1;

/// Lamp fade position or PWM duty.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Level(pub u8);

impl curveipo::CurvePoint<Level> for (Level, Level) {
    fn x(&self) -> Level {
        self.0
    }

    fn y(&self) -> Level {
        self.1
    }
}

impl curveipo::CurveIpo for Level {
    fn lin_inter(
        &self,
        left: &impl curveipo::CurvePoint<Self>,
        right: &impl curveipo::CurvePoint<Self>,
    ) -> Self {
        let lx = left.x().0 as i16;
        let ly = left.y().0 as i16;
        let dx = right.x().0 as i16 - lx;
        let dy = right.y().0 as i16 - ly;
        if dx == 0 {
            left.y()
        } else {
            let y = ly + (self.0 as i16 - lx) * dy / dx;
            Level(y.clamp(0, PWM_LEVELS as i16) as u8)
        }
    }
}

const GAMMA: Curve<Level, (Level, Level), 5> = Curve::new([
    // (fade position, PWM duty)
    (Level(0), Level(0)),
    (Level(8), Level(2)),
    (Level(16), Level(7)),
    (Level(24), Level(17)),
    (Level(FADE_MAX), Level(PWM_LEVELS)),
]);

/// Map a fade position to the number of lit frames per PWM cycle.
pub fn fade_to_duty(pos: u8) -> u8 {
    GAMMA.lin_inter(Level(pos.min(FADE_MAX))).0
}

#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[repr(u8)]
pub enum Aspect {
    /// Stop. Most restrictive.
    #[default]
    Red,
    /// Proceed.
    Green,
    /// Dark.
    Off,
}

impl Aspect {
    /// Wanted (red, green) fade positions.
    const fn positions(self) -> [u8; CHANNELS] {
        match self {
            Aspect::Red => [FADE_MAX, 0],
            Aspect::Green => [0, FADE_MAX],
            Aspect::Off => [0, 0],
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Target {
    pub aspect: Aspect,
    pub flashing: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct SignalOptions {
    pub polarity: Polarity,
    pub searchlight: bool,
}

/// Pin levels of one head for one PWM frame.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Lamps {
    pub red: bool,
    pub green: bool,
}

/// Pin levels of all heads for one PWM frame.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Frame {
    /// The lamp pins must be left floating, if false.
    pub driven: bool,
    pub heads: [Lamps; HEADS],
}

impl Frame {
    pub fn head(&self, head: Direction) -> Lamps {
        self.heads[head.index()]
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
struct Flasher {
    count: u8,
    on: bool,
}

impl Flasher {
    fn advance(self) -> Self {
        let count = self.count + 1;
        if count >= FLASH_CYCLES {
            Self {
                count: 0,
                on: !self.on,
            }
        } else {
            Self { count, on: self.on }
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
struct Fade {
    pos: [u8; CHANNELS],
    duty: [u8; CHANNELS],
}

impl Fade {
    const fn new() -> Self {
        Self {
            pos: [0; CHANNELS],
            duty: [0; CHANNELS],
        }
    }

    fn step(mut self, target: Target, flash_on: bool, searchlight: bool) -> Self {
        let want = if target.flashing && !flash_on {
            Aspect::Off.positions()
        } else {
            target.aspect.positions()
        };

        if searchlight {
            // A searchlight has a single lamp. The old color must be fully
            // dark before the new color may come up.
            for ch in 0..CHANNELS {
                if self.pos[ch] > want[ch] {
                    self.pos[ch] = self.pos[ch].saturating_sub(SEARCHLIGHT_STEP).max(want[ch]);
                }
            }
            for ch in 0..CHANNELS {
                let others_dark = (0..CHANNELS).all(|o| o == ch || self.pos[o] == 0);
                if self.pos[ch] < want[ch] && others_dark {
                    self.pos[ch] = (self.pos[ch] + SEARCHLIGHT_STEP).min(want[ch]);
                }
            }
        } else {
            for ch in 0..CHANNELS {
                let pos = self.pos[ch];
                self.pos[ch] = if pos < want[ch] {
                    (pos + FADE_STEP).min(want[ch])
                } else {
                    pos.saturating_sub(FADE_STEP).max(want[ch])
                };
            }
        }

        for ch in 0..CHANNELS {
            self.duty[ch] = fade_to_duty(self.pos[ch]);
        }
        self
    }

    fn lamps(&self, phase: u8, polarity: Polarity) -> Lamps {
        let invert = polarity == Polarity::CommonAnode;
        Lamps {
            red: (phase < self.duty[RED]) ^ invert,
            green: (phase < self.duty[GREEN]) ^ invert,
        }
    }
}

/// All signal heads of the junction.
pub struct Signals {
    targets: [TickCell<Target>; HEADS],
    options: TickCell<Option<SignalOptions>>,
    fades: [TickCell<Fade>; HEADS],
    phase: TickCell<u8>,
    flasher: TickCell<Flasher>,
}

impl Signals {
    pub const fn new() -> Self {
        const RED_STEADY: Target = Target {
            aspect: Aspect::Red,
            flashing: false,
        };
        Self {
            targets: [TickCell::new(RED_STEADY), TickCell::new(RED_STEADY)],
            options: TickCell::new(None),
            fades: [TickCell::new(Fade::new()), TickCell::new(Fade::new())],
            phase: TickCell::new(0),
            flasher: TickCell::new(Flasher { count: 0, on: true }),
        }
    }

    /// Request a new aspect. The lamps fade towards it.
    pub fn set_aspect(&self, head: Direction, aspect: Aspect, flashing: bool) {
        self.targets[head.index()].set(Target { aspect, flashing });
    }

    pub fn target(&self, head: Direction) -> Target {
        self.targets[head.index()].get()
    }

    /// Set the lamp wiring.
    ///
    /// Only the first call has an effect. The wiring can not change
    /// while the lamps are driven.
    pub fn latch_options(&self, options: SignalOptions) {
        critical_section::with(|cs| {
            self.options.update_cs(cs, |o| o.or(Some(options)));
        });
    }

    pub fn options(&self) -> Option<SignalOptions> {
        self.options.get()
    }

    /// Current (red, green) PWM duty of a head.
    pub fn duty(&self, head: Direction) -> (u8, u8) {
        let fade = self.fades[head.index()].get();
        (fade.duty[RED], fade.duty[GREEN])
    }

    /// Output one PWM frame and advance the phase.
    pub fn tick_cs(&self, cs: CriticalSection<'_>) -> Frame {
        let phase = self.phase.get_cs(cs);
        let options = self.options.get_cs(cs);

        let frame = match options {
            Some(options) => Frame {
                driven: true,
                heads: core::array::from_fn(|i| {
                    self.fades[i].get_cs(cs).lamps(phase, options.polarity)
                }),
            },
            None => Frame::default(),
        };
        let options = options.unwrap_or_default();

        let phase = (phase + 1) % PWM_LEVELS;
        self.phase.set_cs(cs, phase);
        if phase == 0 {
            self.next_cycle_cs(cs, options);
        }

        frame
    }

    fn next_cycle_cs(&self, cs: CriticalSection<'_>, options: SignalOptions) {
        let flasher = self.flasher.update_cs(cs, Flasher::advance);
        for (target, fade) in self.targets.iter().zip(self.fades.iter()) {
            let target = target.get_cs(cs);
            fade.update_cs(cs, |f| f.step(target, flasher.on, options.searchlight));
        }
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}


// vim: ts=4 sw=4 expandtab
