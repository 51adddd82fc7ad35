// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    KERNEL,
    analog::Adc,
    debug::Debug,
    hw::mcu,
    mon::{mon_analog_failure, mon_check},
    ports::{PORTB, PortA, setup_didr},
};
use avr_context::{InitCtx, MainCtx};
use iiab::{Config, Controller};

#[allow(non_snake_case)]
pub struct SysPeriph {
    pub ADC: mcu::ADC,
    pub PORTA: PortA,
}

/// Main loop state.
pub struct System {
    ctrl: Controller,
    adc: Adc,
}

impl System {
    pub const fn new() -> Self {
        Self {
            ctrl: Controller::new(),
            adc: Adc::new(),
        }
    }

    /// Port and ADC setup.
    ///
    /// The lamp wiring is latched here, before the tick runs,
    /// if the option switches can be read.
    pub fn setup(&self, c: &InitCtx, sp: &SysPeriph) {
        sp.PORTA.setup(c);
        setup_didr(&sp.ADC);
        if let Some(options) = self.adc.setup(c, &sp.ADC) {
            KERNEL.latch_signal_options(options.signal_options());
        }
    }

    /// Current switch settings.
    ///
    /// Uses the last good option switch reading, even after the ladder broke.
    /// Without any good reading the lamp wiring stays unknown and the
    /// lamps stay dark.
    fn config(&self, m: &MainCtx<'_>, sp: &SysPeriph) -> Config {
        let options = self.adc.options(m);
        Debug::Options.log_u8(match options {
            Some(o) if !mon_analog_failure() => o.bits(),
            _ => 0xFF,
        });

        Config::from_switches(
            sp.PORTA.dip(),
            options,
            cfg!(feature = "strict-clearing"),
        )
    }

    pub fn run(&mut self, m: &MainCtx<'_>, sp: &SysPeriph) {
        self.adc.run(m, &sp.ADC);
        let config = self.config(m, sp);

        let out = self.ctrl.poll(&KERNEL, PORTB.occupancy(), &config);
        sp.PORTA.set_status(out.status);

        Debug::State.log_u8(out.state as u8);
        Debug::Holder.log_u8(out.holder.map_or(0xFF, |d| d as u8));
        Debug::Occupancy.log_u8(out.occupancy.bits());
        Debug::DwellSecs.log_u16(out.dwell_secs);

        mon_check();
    }
}

/// Cheaper Option::unwrap() alternative.
///
/// This is cheaper, because it doesn't call into the panic unwind path.
/// Therefore, it does not impose caller-saves overhead onto the calling function.
#[inline(always)]
pub fn unwrap_option<T>(value: Option<T>) -> T {
    match value {
        Some(value) => value,
        None => reset_system(),
    }
}

/// Reset the system.
///
/// The signals come back up with both heads RED.
#[inline(always)]
#[allow(clippy::empty_loop)]
pub fn reset_system() -> ! {
    loop {
        // Wait for the watchdog timer to trigger and reset the system.
        // We don't need to disable interrupts here.
        // No interrupt will reset the watchdog timer.
    }
}

#[inline(always)]
#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    reset_system();
}

// vim: ts=4 sw=4 expandtab
