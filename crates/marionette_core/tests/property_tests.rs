//! Property-based tests for marionette_core.
//!
//! Cadence arithmetic and the scripted random source must hold for all
//! inputs, not just the hand-picked schedule examples in the unit tests.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use marionette_core::{Cadence, RandomSource, ScriptedRandom};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    // 2020-01-01 .. 2030-01-01
    (1_577_836_800i64..1_893_456_000i64).prop_map(|s| Utc.timestamp_opt(s, 0).unwrap())
}

fn arb_cadence() -> impl Strategy<Value = Cadence> {
    (
        1u64..=(48 * 3600),
        proptest::option::of((0u32..24, 0u32..60)),
    )
        .prop_map(|(every_secs, anchor)| Cadence {
            every_secs,
            anchor: anchor.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)),
        })
}

// ============================================================================
// Cadence
// ============================================================================

proptest! {
    /// The next firing is always strictly in the future and never more than
    /// one interval away.
    #[test]
    fn next_after_is_within_one_interval(c in arb_cadence(), t in arb_instant()) {
        let next = c.next_after(t);
        prop_assert!(next > t);
        prop_assert!((next - t).num_seconds() <= c.every_secs as i64);
    }

    /// Anchored cadences only fire on their grid.
    #[test]
    fn anchored_firings_stay_on_grid(
        every_secs in 1u64..=(24 * 3600),
        h in 0u32..24,
        m in 0u32..60,
        t in arb_instant(),
    ) {
        let anchor = NaiveTime::from_hms_opt(h, m, 0).unwrap();
        let c = Cadence { every_secs, anchor: Some(anchor) };
        let next = c.next_after(t);
        let base = t.date_naive().and_time(anchor).and_utc();
        let offset = (next - base).num_seconds();
        prop_assert_eq!(offset.rem_euclid(every_secs as i64), 0);
    }

    /// Chaining next_after is strictly increasing.
    #[test]
    fn successive_firings_increase(c in arb_cadence(), t in arb_instant()) {
        let a = c.next_after(t);
        let b = c.next_after(a);
        prop_assert!(b > a);
    }
}

// ============================================================================
// ScriptedRandom
// ============================================================================

proptest! {
    #[test]
    fn scripted_index_always_in_range(draws in prop::collection::vec(0usize..10_000, 0..32), len in 1usize..50) {
        let rng = ScriptedRandom::new(draws.clone());
        for _ in 0..draws.len() + 2 {
            prop_assert!(rng.index(len) < len);
        }
    }
}
