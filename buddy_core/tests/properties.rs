//! Property tests for the BAC model and the event store.

use buddy_core::{BacModel, Profile, SessionEventStore, SessionEvent};
use chrono::Utc;
use proptest::prelude::*;

fn event_strategy() -> impl Strategy<Value = SessionEvent> {
    (0.0f64..12.0, 0.1f64..4.0).prop_map(|(hours_ago, sd)| SessionEvent::new(hours_ago, sd))
}

fn profile_strategy() -> impl Strategy<Value = Profile> {
    (90.0f64..350.0, any::<bool>()).prop_map(|(weight_lb, is_male)| Profile { weight_lb, is_male })
}

proptest! {
    #[test]
    fn permutation_does_not_change_curve(
        profile in profile_strategy(),
        events in prop::collection::vec(event_strategy(), 0..8),
        seed in any::<u64>(),
    ) {
        let model = BacModel::default();
        let mut shuffled = events.clone();
        // Rotate, and reverse on even seeds
        if !shuffled.is_empty() {
            let k = (seed as usize) % shuffled.len();
            shuffled.rotate_left(k);
            if seed % 2 == 0 {
                shuffled.reverse();
            }
        }

        prop_assert_eq!(
            model.bac_now(&profile, &events).to_bits(),
            model.bac_now(&profile, &shuffled).to_bits()
        );
        prop_assert_eq!(model.curve(&profile, &events), model.curve(&profile, &shuffled));
    }

    #[test]
    fn curve_is_never_negative(
        profile in profile_strategy(),
        events in prop::collection::vec(event_strategy(), 0..8),
    ) {
        let curve = BacModel::default().curve(&profile, &events);
        prop_assert!(curve.points.iter().all(|p| p.bac >= 0.0 && p.bac.is_finite()));
    }

    #[test]
    fn curve_decays_after_last_absorption(
        profile in profile_strategy(),
        events in prop::collection::vec(event_strategy(), 1..8),
    ) {
        let model = BacModel::default();
        let absorption = model.config().absorption_hours;
        let settled_from = events
            .iter()
            .map(|e| -e.hours_ago + absorption)
            .fold(f64::MIN, f64::max);

        let curve = model.curve(&profile, &events);
        let tail: Vec<_> = curve.points.iter().filter(|p| p.t >= settled_from).collect();
        for pair in tail.windows(2) {
            prop_assert!(
                pair[1].bac <= pair[0].bac + 1e-12,
                "rose from {} to {} at t={}",
                pair[0].bac,
                pair[1].bac,
                pair[1].t
            );
        }
    }

    #[test]
    fn repeated_queries_are_identical(
        profile in profile_strategy(),
        events in prop::collection::vec(event_strategy(), 0..8),
    ) {
        let model = BacModel::default();
        let first = model.curve(&profile, &events);
        let second = model.curve(&profile, &events);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn delete_then_restore_round_trips(
        profile in profile_strategy(),
        events in prop::collection::vec(event_strategy(), 1..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let model = BacModel::default();
        let mut store = SessionEventStore::new(Utc::now());
        for event in &events {
            store.append(*event).unwrap();
        }
        let before = store.events().to_vec();
        let curve_before = model.curve(&profile, store.events());

        let deleted = store.delete_at(pick.index(events.len())).unwrap();
        prop_assert_eq!(store.len(), events.len() - 1);
        store.restore(deleted.deleted_index, deleted.deleted_event).unwrap();

        prop_assert_eq!(store.events(), before.as_slice());
        prop_assert_eq!(model.curve(&profile, store.events()), curve_before);
    }
}
