// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests of the safety invariants over arbitrary detector inputs.

use iiab::{
    Aspect, Config, Controller, Direction, DwellClass, Kernel, Millis, Occupancy, State,
    StateKind, TimeoutClass, debounce::Debounce, timer::TICKS_PER_MS,
};
use proptest::prelude::*;

/// One stretch of constant raw detector input.
#[derive(Debug, Clone)]
struct Segment {
    raw: u8,
    ms: u32,
}

fn arb_segment() -> impl Strategy<Value = Segment> {
    (
        0u8..8,
        prop_oneof![
            // Shorter than the debounce window.
            1u32..80,
            80u32..2_000,
            // Long enough for the timeouts.
            10_000u32..20_000,
        ],
    )
        .prop_map(|(raw, ms)| Segment { raw, ms })
}

fn arb_config() -> impl Strategy<Value = Config> {
    (0u8..16, 0u8..4, any::<bool>(), any::<bool>()).prop_map(
        |(dwell, timeout, randomized, strict_clearing)| Config {
            dwell_class: DwellClass::new(dwell),
            timeout_class: TimeoutClass::new(timeout),
            randomized,
            strict_clearing,
            ..Default::default()
        },
    )
}

/// States in which the junction lock must be held by the state's holder.
fn holds_lock(state: &State) -> bool {
    matches!(
        state,
        State::Clearance(_)
            | State::Timeout(_)
            | State::Occupied(_)
            | State::Lockout(_)
            | State::Clearing(_)
            | State::Reset(_)
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The lock has at most one holder, it is always the holder of the
    /// state machine, and only that holder may see GREEN.
    #[test]
    fn mutual_exclusion(
        cfg in arb_config(),
        segments in proptest::collection::vec(arb_segment(), 1..10),
    ) {
        let kernel = Kernel::new();
        let mut ctrl = Controller::new();

        for seg in &segments {
            let raw = Occupancy::from_bits(seg.raw);
            for _ in 0..seg.ms {
                for _ in 0..TICKS_PER_MS {
                    kernel.tick();
                }
                let out = ctrl.poll(&kernel, raw, &cfg);
                let state = ctrl.state();

                if holds_lock(&state) {
                    prop_assert_eq!(ctrl.lock().holder(), state.holder());
                } else {
                    prop_assert_eq!(ctrl.lock().holder(), None);
                }

                prop_assert!(out.aspects != [Aspect::Green, Aspect::Green]);
                for head in Direction::ALL {
                    let aspect = out.aspects[head.index()];
                    prop_assert!(aspect == Aspect::Red || aspect == Aspect::Green);
                    if aspect == Aspect::Green {
                        prop_assert!(matches!(
                            out.state,
                            StateKind::Clearance | StateKind::Timeout
                        ));
                        prop_assert_eq!(ctrl.lock().holder(), Some(head));
                    }
                    prop_assert_eq!(kernel.signals().target(head).aspect, aspect);
                }
            }
        }
    }

    /// An output bit only changes after 8 agreeing samples,
    /// and 8 agreeing samples always get through.
    #[test]
    fn debounce_window(
        samples in proptest::collection::vec(0u8..8, 1..300),
    ) {
        let mut deb = Debounce::<8>::new();
        let mut prev = deb.read();

        for (i, raw) in samples.iter().enumerate() {
            prop_assert!(deb.update(Millis(i as u32 * 10), *raw));
            let out = deb.read();
            let window = &samples[i.saturating_sub(7)..=i];

            for bit in 0..3 {
                let mask = 1u8 << bit;
                let full = window.len() == 8;
                let all_set = full && window.iter().all(|s| s & mask != 0);
                let all_clear = full && window.iter().all(|s| s & mask == 0);

                if all_set {
                    prop_assert!(out & mask != 0);
                } else if all_clear {
                    prop_assert!(out & mask == 0);
                } else if window.iter().any(|s| s & mask == 0) {
                    // Mixed window. The bit keeps its value.
                    prop_assert_eq!(out & mask, prev & mask);
                }
            }
            prev = out;
        }
    }
}

// vim: ts=4 sw=4 expandtab
