// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{signal::SignalOptions, timer::Millis};

/// Selects the dwell that precedes a grant. See [crate::dwell].
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct DwellClass(u8);

impl DwellClass {
    pub const COUNT: usize = 16;

    /// Out-of-range values are clamped to the last class.
    pub const fn new(class: u8) -> Self {
        if class as usize >= Self::COUNT {
            Self(Self::COUNT as u8 - 1)
        } else {
            Self(class)
        }
    }

    pub const fn index(self) -> u8 {
        self.0
    }
}

/// Selects the approach timeout and the lockout interval.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct TimeoutClass(u8);

impl TimeoutClass {
    pub const COUNT: usize = 4;

    /// Out-of-range values are clamped to the last class.
    pub const fn new(class: u8) -> Self {
        if class as usize >= Self::COUNT {
            Self(Self::COUNT as u8 - 1)
        } else {
            Self(class)
        }
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    /// 15, 30, 45 or 60 seconds.
    pub const fn secs(self) -> u16 {
        15 + 15 * self.0 as u16
    }
}

/// Electrical sense of the signal head lamp outputs.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum Polarity {
    /// Lamp lit when the pin is driven high.
    #[default]
    CommonCathode,
    /// Lamp lit when the pin is driven low.
    CommonAnode,
}

/// Snapshot of all operator settings.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Config {
    pub dwell_class: DwellClass,
    pub timeout_class: TimeoutClass,
    pub randomized: bool,
    /// Lamp wiring and head style. `None` while it is not known.
    /// Only the first known value is used.
    pub signal: Option<SignalOptions>,
    /// Leaving CLEARING also requires the junction to be clear.
    pub strict_clearing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dwell_class: DwellClass::default(),
            timeout_class: TimeoutClass::default(),
            randomized: false,
            signal: Some(SignalOptions::default()),
            strict_clearing: false,
        }
    }
}

/// Full scale of the 10 bit option ladder conversion.
pub const LADDER_ADC_MAX: u16 = 0x3FF;
/// Number of ladder steps above zero. Five binary weighted switches.
const LADDER_STEPS: u32 = 0x1F;
/// Maximum distance of a reading from the nominal step voltage.
const LADDER_TOLERANCE: u16 = 10;

/// State of the five option switches on the resistor ladder.
///
/// | bit  | meaning                |
/// |------|------------------------|
/// | 0..1 | timeout class          |
/// | 2    | randomized dwell       |
/// | 3    | searchlight heads      |
/// | 4    | common anode heads     |
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct OptionSwitches(u8);

impl OptionSwitches {
    const TIMEOUT_MASK: u8 = 0x03;
    const RANDOMIZE: u8 = 1 << 2;
    const SEARCHLIGHT: u8 = 1 << 3;
    const COMMON_ANODE: u8 = 1 << 4;

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & LADDER_STEPS as u8)
    }

    /// Decode an ADC reading of the ladder.
    ///
    /// Returns `None`, if the reading is not close to any
    /// switch combination.
    pub fn from_ladder(adc: u16) -> Option<Self> {
        if adc > LADDER_ADC_MAX {
            return None;
        }
        let full = LADDER_ADC_MAX as u32;
        let code = (adc as u32 * LADDER_STEPS + full / 2) / full;
        let nominal = (code * full / LADDER_STEPS) as u16;
        if adc.abs_diff(nominal) > LADDER_TOLERANCE {
            None
        } else {
            Some(Self(code as u8))
        }
    }

    /// Nominal ADC reading of this combination.
    pub const fn to_ladder(self) -> u16 {
        (self.0 as u32 * LADDER_ADC_MAX as u32 / LADDER_STEPS) as u16
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn timeout_class(self) -> TimeoutClass {
        TimeoutClass::new(self.0 & Self::TIMEOUT_MASK)
    }

    pub const fn randomized(self) -> bool {
        self.0 & Self::RANDOMIZE != 0
    }

    pub const fn searchlight(self) -> bool {
        self.0 & Self::SEARCHLIGHT != 0
    }

    pub const fn polarity(self) -> Polarity {
        if self.0 & Self::COMMON_ANODE != 0 {
            Polarity::CommonAnode
        } else {
            Polarity::CommonCathode
        }
    }

    pub const fn signal_options(self) -> SignalOptions {
        SignalOptions {
            polarity: self.polarity(),
            searchlight: self.searchlight(),
        }
    }
}

impl Config {
    /// Build the configuration from the switch states.
    ///
    /// `dip` is the (already inverted) dwell DIP switch nibble.
    /// Without an option switch reading the timeout class and the dwell
    /// mode fall back to their defaults and the lamp wiring stays unknown.
    pub const fn from_switches(
        dip: u8,
        options: Option<OptionSwitches>,
        strict_clearing: bool,
    ) -> Self {
        let (sw, signal) = match options {
            Some(sw) => (sw, Some(sw.signal_options())),
            None => (OptionSwitches(0), None),
        };
        Self {
            dwell_class: DwellClass::new(dip & 0x0F),
            timeout_class: sw.timeout_class(),
            randomized: sw.randomized(),
            signal,
            strict_clearing,
        }
    }

    pub const fn timeout(&self) -> Millis {
        Millis::from_secs(self.timeout_class.secs())
    }

    /// The lockout is as long as the approach timeout.
    pub const fn lockout(&self) -> Millis {
        self.timeout()
    }
}


// vim: ts=4 sw=4 expandtab
