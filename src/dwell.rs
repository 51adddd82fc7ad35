// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{config::DwellClass, timer::Millis};
use rand_core::{RngCore, SeedableRng};
use rand_pcg::Pcg32;

/// Seconds per class step in fixed (non-random) mode.
pub const FIXED_STEP_SECS: u16 = 5;

/// Dwell returned by the short mode of a bimodal class.
pub const NOMINAL_DWELL_SECS: u16 = 1;

/// How strongly a class prefers the nominal dwell.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Skew {
    /// Plain uniform distribution.
    None,
    /// 90% nominal dwell.
    Low,
    /// 70% nominal dwell.
    Mid,
    /// 25% nominal dwell.
    High,
}

impl Skew {
    /// Probability of the nominal dwell, in percent.
    pub const fn nominal_percent(self) -> u32 {
        match self {
            Skew::None => 0,
            Skew::Low => 90,
            Skew::Mid => 70,
            Skew::High => 25,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DwellRange {
    pub min: u16,
    pub max: u16,
    pub skew: Skew,
}

const fn range(min: u16, max: u16, skew: Skew) -> DwellRange {
    DwellRange { min, max, skew }
}

#[rustfmt::skip]
const RANDOM_TABLE: [DwellRange; DwellClass::COUNT] = [
    range(0, 5, Skew::None),
    range(0, 10, Skew::None),
    range(0, 15, Skew::None),
    range(0, 20, Skew::None),

    range(5, 15, Skew::None),
    range(5, 20, Skew::None),
    range(5, 25, Skew::None),
    range(5, 30, Skew::None),

    range(15, 30, Skew::Low),
    range(15, 40, Skew::Mid),
    range(15, 50, Skew::High),
    range(15, 60, Skew::None),

    range(30, 60, Skew::Low),
    range(30, 120, Skew::Mid),

    range(60, 120, Skew::High),
    range(60, 300, Skew::None),
];

impl DwellClass {
    pub const fn random_range(self) -> DwellRange {
        RANDOM_TABLE[self.index() as usize]
    }
}

/// Uniform random number in `0..span`.
///
/// Multiply-shift with rejection: the result comes from the high word
/// and the rejected low-word zone removes the bias.
fn uniform(rng: &mut impl RngCore, span: u32) -> u32 {
    debug_assert!(span > 0);
    let threshold = span.wrapping_neg() % span;
    loop {
        let m = rng.next_u32() as u64 * span as u64;
        if m as u32 >= threshold {
            return (m >> 32) as u32;
        }
    }
}

/// Computes the artificial dwell that precedes a grant.
pub struct DwellGenerator<R = Pcg32> {
    rng: Option<R>,
}

impl<R> DwellGenerator<R> {
    pub const fn new() -> Self {
        Self { rng: None }
    }
}

impl<R: RngCore + SeedableRng> DwellGenerator<R> {
    /// Dwell in seconds for the given class.
    ///
    /// The random source is seeded from `now` on the first randomized call
    /// and never again.
    pub fn compute_delay(&mut self, class: DwellClass, randomized: bool, now: Millis) -> u16 {
        if !randomized {
            return class.index() as u16 * FIXED_STEP_SECS;
        }

        let range = class.random_range();
        let rng = self
            .rng
            .get_or_insert_with(|| R::seed_from_u64(now.0.into()));

        let nominal = range.skew.nominal_percent();
        if nominal > 0 && uniform(rng, 100) < nominal {
            return NOMINAL_DWELL_SECS;
        }

        let span = (range.max - range.min) as u32 + 1;
        range.min + uniform(rng, span) as u16
    }
}

impl<R> Default for DwellGenerator<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fixed() {
        let mut dwell = DwellGenerator::<Pcg32>::new();
        for class in 0..16 {
            for t in 0..10 {
                assert_eq!(
                    dwell.compute_delay(DwellClass::new(class), false, Millis(t * 1234)),
                    class as u16 * 5
                );
            }
        }
        assert!(dwell.rng.is_none());
    }

    #[test]
    fn test_fixed_clamped() {
        let mut dwell = DwellGenerator::<Pcg32>::new();
        assert_eq!(dwell.compute_delay(DwellClass::new(200), false, Millis(0)), 75);
    }

    #[test]
    fn test_uniform_in_range() {
        let mut dwell = DwellGenerator::<Pcg32>::new();
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..5000 {
            let d = dwell.compute_delay(DwellClass::new(4), true, Millis(42));
            assert!((5..=15).contains(&d));
            seen_min |= d == 5;
            seen_max |= d == 15;
        }
        assert!(seen_min && seen_max);
    }

    #[test]
    fn test_bimodal_low() {
        let class = DwellClass::new(8);
        assert_eq!(class.random_range(), range(15, 30, Skew::Low));

        let mut dwell = DwellGenerator::<Pcg32>::new();
        const N: u32 = 20000;
        let mut nominal = 0;
        for _ in 0..N {
            let d = dwell.compute_delay(class, true, Millis(7));
            if d == NOMINAL_DWELL_SECS {
                nominal += 1;
            } else {
                assert!((15..=30).contains(&d), "{d}");
            }
        }
        // 90% +- 1.5%
        assert!(nominal > N * 885 / 1000, "{nominal}");
        assert!(nominal < N * 915 / 1000, "{nominal}");
    }

    #[test]
    fn test_bimodal_high() {
        let mut dwell = DwellGenerator::<Pcg32>::new();
        const N: u32 = 20000;
        let mut nominal = 0;
        for _ in 0..N {
            let d = dwell.compute_delay(DwellClass::new(10), true, Millis(99));
            if d == NOMINAL_DWELL_SECS {
                nominal += 1;
            } else {
                assert!((15..=50).contains(&d));
            }
        }
        assert!(nominal > N * 235 / 1000, "{nominal}");
        assert!(nominal < N * 265 / 1000, "{nominal}");
    }

    #[test]
    fn test_seeded_once() {
        let class = DwellClass::new(15);
        let mut a = DwellGenerator::<Pcg32>::new();
        let mut b = DwellGenerator::<Pcg32>::new();
        let first_a = a.compute_delay(class, true, Millis(1000));
        let first_b = b.compute_delay(class, true, Millis(1000));
        assert_eq!(first_a, first_b);
        // Later calls must not reseed from the new time.
        for i in 0..50 {
            assert_eq!(
                a.compute_delay(class, true, Millis(5000 + i)),
                b.compute_delay(class, true, Millis(1000)),
            );
        }
    }

    #[test]
    fn test_uniform_unbiased_small_span() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut hist = [0u32; 3];
        for _ in 0..30000 {
            hist[uniform(&mut rng, 3) as usize] += 1;
        }
        for count in hist {
            assert!((9500..10500).contains(&count), "{count}");
        }
    }
}

// vim: ts=4 sw=4 expandtab
