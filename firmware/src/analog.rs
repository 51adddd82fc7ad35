// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{hw::mcu, mon::mon_report_analog_failure};
use avr_context::{InitCtx, MainCtx, MainCtxCell};
use iiab::OptionSwitches;

/// Number of consecutive undecodable readings before the ladder is
/// considered broken.
const LADDER_FAULT_LIMIT: u8 = 8;

/// Non-blocking sampler of the option switch ladder on ADC6.
pub struct Adc {
    running: MainCtxCell<bool>,
    result: MainCtxCell<Option<OptionSwitches>>,
    bad: MainCtxCell<u8>,
}

impl Adc {
    pub const fn new() -> Self {
        Self {
            running: MainCtxCell::new(false),
            result: MainCtxCell::new(None),
            bad: MainCtxCell::new(0),
        }
    }

    fn select_ladder(&self, adc: &mcu::ADC) {
        adc.admux().write(|w| w.refs().vcc().mux().adc6());
    }

    #[rustfmt::skip]
    #[inline]
    fn start_conversion(&self, adc: &mcu::ADC) {
        adc.adcsra().modify(|_, w| {
            w.adif().set_bit()
             .adsc().set_bit()
        });
    }

    #[inline]
    fn conversion_done(&self, adc: &mcu::ADC) -> bool {
        adc.adcsra().read().adif().bit_is_set()
    }

    fn convert_blocking(&self, adc: &mcu::ADC) -> u16 {
        self.select_ladder(adc);
        self.start_conversion(adc);
        while !self.conversion_done(adc) {}
        adc.adc().read().bits()
    }

    /// Enable the ADC and read the option switches once.
    ///
    /// This is the only place that waits for conversions.
    /// Returns `None`, if no reading could be decoded.
    #[rustfmt::skip]
    pub fn setup(&self, _: &InitCtx, adc: &mcu::ADC) -> Option<OptionSwitches> {
        adc.adcsra().write(|w| {
            w.adps().prescaler_128()
             .adie().clear_bit()
             .adif().set_bit()
             .adsc().clear_bit()
             .aden().set_bit()
        });

        // The first conversion after enabling is not accurate.
        self.convert_blocking(adc);

        (0..LADDER_FAULT_LIMIT)
            .find_map(|_| OptionSwitches::from_ladder(self.convert_blocking(adc)))
    }

    /// Collect a finished conversion and start the next one.
    pub fn run(&self, m: &MainCtx<'_>, adc: &mcu::ADC) {
        if self.running.get(m) {
            if !self.conversion_done(adc) {
                return;
            }
            let raw = adc.adc().read().bits();
            match OptionSwitches::from_ladder(raw) {
                Some(options) => {
                    self.result.set(m, Some(options));
                    self.bad.set(m, 0);
                }
                None => {
                    let bad = self.bad.get(m).saturating_add(1);
                    self.bad.set(m, bad);
                    if bad >= LADDER_FAULT_LIMIT {
                        mon_report_analog_failure();
                    }
                }
            }
            self.running.set(m, false);
        }

        self.select_ladder(adc);
        self.start_conversion(adc);
        self.running.set(m, true);
    }

    /// The most recent good reading.
    ///
    /// A later fault does not discard it.
    pub fn options(&self, m: &MainCtx<'_>) -> Option<OptionSwitches> {
        self.result.get(m)
    }
}

// vim: ts=4 sw=4 expandtab
