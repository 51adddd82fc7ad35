// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::cell::Cell;
use critical_section::{CriticalSection, Mutex};

/// A value that is shared between the tick interrupt and the main loop.
///
/// Every access from outside of the tick runs in its own critical section,
/// so multi-byte values can never be observed half-written.
/// The tick itself already runs with interrupts disabled and
/// uses the `*_cs` accessors with the [CriticalSection] token it holds.
pub struct TickCell<T> {
    inner: Mutex<Cell<T>>,
}

impl<T> TickCell<T> {
    #[inline]
    pub const fn new(inner: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(inner)),
        }
    }
}

impl<T: Copy> TickCell<T> {
    #[inline]
    pub fn get(&self) -> T {
        critical_section::with(|cs| self.get_cs(cs))
    }

    #[inline]
    pub fn set(&self, value: T) {
        critical_section::with(|cs| self.set_cs(cs, value));
    }

    #[inline]
    pub fn get_cs(&self, cs: CriticalSection<'_>) -> T {
        self.inner.borrow(cs).get()
    }

    #[inline]
    pub fn set_cs(&self, cs: CriticalSection<'_>, value: T) {
        self.inner.borrow(cs).set(value);
    }

    /// Read-modify-write in one critical section.
    #[inline]
    pub fn update_cs(&self, cs: CriticalSection<'_>, f: impl FnOnce(T) -> T) -> T {
        let cell = self.inner.borrow(cs);
        let value = f(cell.get());
        cell.set(value);
        value
    }
}

// vim: ts=4 sw=4 expandtab
