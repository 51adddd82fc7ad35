// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]
#![feature(asm_experimental_arch)]

mod analog;
mod debug;
mod hw;
mod mon;
mod ports;
mod system;
mod timer;

use crate::{
    hw::{Peripherals, interrupt, mcu},
    ports::{PORTB, PortA, PortB},
    system::{SysPeriph, System, unwrap_option},
    timer::TimerPeriph,
};
use avr_context::MainCtx;
use iiab::Kernel;

/// Timebase and signal heads. Shared with the tick interrupt.
pub static KERNEL: Kernel = Kernel::new();

fn wdt_init() {
    // SAFETY: The asm code only accesses the WDT registers
    //         which are not accessed from anywhere else in the program.
    unsafe {
        // Enable WDT with timeout 1 s
        core::arch::asm!(
            "ldi {tmp}, 0x18", // WDCE=1, WDE=1
            "out {WDTCR}, {tmp}",
            "ldi {tmp}, 0x0E", // WDCE=0, WDE=1, WDP2=1, WDP1=1, WDP0=0
            "out {WDTCR}, {tmp}",
            tmp = out(reg_upper) _,
            WDTCR = const 0x21,
            options(nostack, preserves_flags)
        );
    }
}

fn wdt_poke(_wp: &mcu::WDT) {
    avr_device::asm::wdr();
}

#[avr_device::entry]
fn main() -> ! {
    wdt_init();

    let dp = unwrap_option(Peripherals::take());

    let sp = SysPeriph {
        ADC: dp.ADC,
        PORTA: PortA { PORTA: dp.PORTA },
    };

    let tp = TimerPeriph {
        TC0: dp.TC0,
        TC1: dp.TC1,
    };

    let mut sys = System::new();

    // SAFETY:
    // This is the context handle for the main() function.
    // Holding a reference to this object proves that the holder
    // is running in main() context.
    let m = unsafe {
        MainCtx::new_with_init(|c| {
            PORTB.init(c, PortB { PORTB: dp.PORTB });
            PORTB.setup(c);
            sys.setup(c, &sp);
            tp.setup(c);
        })
    };

    // SAFETY: This must be after construction of MainCtx
    //         and after initialization of static InitCtxCell variables.
    unsafe { interrupt::enable() };

    loop {
        sys.run(&m, &sp);
        wdt_poke(&dp.WDT);
    }
}

// vim: ts=4 sw=4 expandtab
