// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{KERNEL, hw::mcu, ports::PORTB};
use avr_context::{InitCtx, IrqCtx};

/// Timer 0 compare value for a 4 kHz tick at 8 MHz and prescaler 8.
const TICK_OCR: u8 = (8_000_000 / 8 / iiab::timer::TICK_HZ - 1) as u8;

#[allow(non_snake_case)]
pub struct TimerPeriph {
    pub TC0: mcu::TC0,
    pub TC1: mcu::TC1,
}

impl TimerPeriph {
    #[rustfmt::skip]
    pub fn setup(&self, _: &InitCtx) {
        // Timer 0 configuration:
        // 8 bit, CTC mode, CS: 8 -> 1 us per timer tick.
        self.TC0.tccr0b().write(|w| w);
        self.TC0.tcnt0l().write(|w| w);
        // SAFETY: Plain data registers. Any value is valid.
        unsafe {
            self.TC0.ocr0a().write(|w| w.bits(TICK_OCR));
        }
        self.TC0.tccr0a().write(|w| w.ctc0().set_bit());
        self.TC0.tccr0b().write(|w| w.cs0().prescale_8());

        // TIMSK and TIFR are shared between timer 0 and timer 1.
        self.TC1.tifr().write(|w| w.ocf0a().set_bit());
        self.TC1.timsk().write(|w| w.ocie0a().set_bit());
    }
}

/// The 4 kHz tick.
///
/// Drives the timebase and the signal PWM.
/// The frame is written immediately, so the PWM edges do not jitter
/// with the main loop.
pub fn irq_handler_timer0_compa(c: &IrqCtx) {
    let frame = KERNEL.tick();
    PORTB.write_lamps(c, &frame);
}

// vim: ts=4 sw=4 expandtab
