// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::hw::mcu;
use avr_context::{InitCtx, InitCtxCell, IrqCtx};
use iiab::{Frame, Occupancy, Status};

#[allow(non_snake_case)]
pub struct PortA {
    pub PORTA: mcu::PORTA,
}

#[allow(non_snake_case)]
pub struct PortB {
    pub PORTB: mcu::PORTB,
}

// SAFETY: Is initialized when constructing the MainCtx.
pub static PORTB: InitCtxCell<PortB> = unsafe { InitCtxCell::uninit() };

/// PB0..PB3: A red, A green, B red, B green.
const LAMP_MASK: u8 = 0x0F;
/// PB4..PB6: approach A, approach B, junction. Active low.
const DETECTOR_SHIFT: u8 = 4;
/// PA0..PA3: dwell class DIP switches. Active low.
const DIP_MASK: u8 = 0x0F;
/// PA4..PA6: status LED red, green, blue.
const STATUS_SHIFT: u8 = 4;
const STATUS_MASK: u8 = 0x70;

fn pin_input(_bit: usize) -> u8 {
    0
}
fn pin_output(bit: usize) -> u8 {
    1 << bit
}
fn pin_low(_bit: usize) -> u8 {
    0
}
fn pin_floating(_bit: usize) -> u8 {
    0
}
fn pin_pullup(bit: usize) -> u8 {
    1 << bit
}

impl PortA {
    pub fn setup(&self, _: &InitCtx) {
        // SAFETY: Called with interrupts disabled. Ensured by &InitCtx.
        unsafe {
            self.PORTA.porta().write(|w| {
                w.bits(
                    pin_pullup(0) | // DIP 0
                    pin_pullup(1) | // DIP 1
                    pin_pullup(2) | // DIP 2
                    pin_pullup(3) | // DIP 3
                    pin_low(4) | // status red
                    pin_low(5) | // status green
                    pin_low(6) | // status blue
                    pin_floating(7), // option ladder, single ended ADC
                )
            });
            self.PORTA.ddra().write(|w| {
                w.bits(
                    pin_input(0) | // DIP 0
                    pin_input(1) | // DIP 1
                    pin_input(2) | // DIP 2
                    pin_input(3) | // DIP 3
                    pin_output(4) | // status red
                    pin_output(5) | // status green
                    pin_output(6) | // status blue
                    pin_input(7), // option ladder, single ended ADC
                )
            });
        }
    }

    /// Dwell class DIP switches. A closed switch reads as 1.
    pub fn dip(&self) -> u8 {
        !self.PORTA.pina().read().bits() & DIP_MASK
    }

    pub fn set_status(&self, status: Status) {
        let (r, g, b) = status.rgb();
        let bits = ((r as u8) | (g as u8) << 1 | (b as u8) << 2) << STATUS_SHIFT;
        self.PORTA.porta().modify(|r, w| {
            // SAFETY: Only the status LED bits are changed.
            //         PORTA is not written from interrupt context.
            unsafe { w.bits((r.bits() & !STATUS_MASK) | bits) }
        });
    }
}

impl PortB {
    /// The lamp pins start floating.
    /// They only become outputs once the lamp wiring is known.
    pub fn setup(&self, _: &InitCtx) {
        // SAFETY: Called with interrupts disabled. Ensured by &InitCtx.
        unsafe {
            self.PORTB.portb().write(|w| {
                w.bits(
                    pin_floating(0) | // head A red
                    pin_floating(1) | // head A green
                    pin_floating(2) | // head B red
                    pin_floating(3) | // head B green
                    pin_pullup(4) | // approach A detector, active low
                    pin_pullup(5) | // approach B detector, active low
                    pin_pullup(6) | // junction detector, active low
                    pin_floating(7), // RESET, Debug-Wire
                )
            });
            self.PORTB.ddrb().write(|w| {
                w.bits(
                    pin_input(0) | // head A red
                    pin_input(1) | // head A green
                    pin_input(2) | // head B red
                    pin_input(3) | // head B green
                    pin_input(4) | // approach A detector
                    pin_input(5) | // approach B detector
                    pin_input(6) | // junction detector
                    pin_input(7), // RESET, Debug-Wire
                )
            });
        }
    }

    /// Raw (undebounced) detector states.
    ///
    /// This is a single atomic read of PINB.
    pub fn occupancy(&self) -> Occupancy {
        let pinb = self.PORTB.pinb().read().bits();
        Occupancy::from_bits(!pinb >> DETECTOR_SHIFT)
    }

    /// Drive the signal head lamps.
    ///
    /// PORTB and DDRB are only ever written from here after setup.
    /// An undriven frame leaves the pins as they are.
    pub fn write_lamps(&self, _: &IrqCtx, frame: &Frame) {
        if !frame.driven {
            return;
        }
        let mut bits = 0;
        for (i, head) in frame.heads.iter().enumerate() {
            bits |= ((head.red as u8) | (head.green as u8) << 1) << (i * 2);
        }
        // Level first, then direction. The pins never drive a stale level.
        self.PORTB.portb().modify(|r, w| {
            // SAFETY: Only the lamp bits are changed. Interrupts are disabled.
            unsafe { w.bits((r.bits() & !LAMP_MASK) | bits) }
        });
        self.PORTB.ddrb().modify(|r, w| {
            // SAFETY: Only the lamp bits are changed. Interrupts are disabled.
            unsafe { w.bits(r.bits() | LAMP_MASK) }
        });
    }
}

#[rustfmt::skip]
pub fn setup_didr(adc: &mcu::ADC) {
    adc.didr0().write(|w| {
        w.adc0d().clear_bit()
         .adc1d().clear_bit()
         .adc2d().clear_bit()
         .arefd().clear_bit()
         .adc3d().clear_bit()
         .adc4d().clear_bit()
         .adc5d().clear_bit()
         .adc6d().set_bit() // PA7: option ladder
    });
    adc.didr1().write(|w| {
        w.adc7d().clear_bit()
         .adc8d().clear_bit()
         .adc9d().clear_bit()
         .adc10d().clear_bit()
    });
}

// vim: ts=4 sw=4 expandtab
