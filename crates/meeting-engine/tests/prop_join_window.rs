//! Property-based tests for join-window state and occurrence resolution.

use chrono::{DateTime, Duration, TimeZone, Utc};
use meeting_engine::join_window::occurrence_join_state;
use meeting_engine::recurrence::RecurrenceRule;
use meeting_engine::{current_or_next_occurrence, JoinState, Meeting, Occurrence};
use proptest::prelude::*;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 15, 0, 0).unwrap()
}

fn rank(state: JoinState) -> u8 {
    match state {
        JoinState::NotYetOpen => 0,
        JoinState::Joinable => 1,
        JoinState::Ended => 2,
    }
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: state only moves forward as time advances
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn state_is_monotonic_in_time(
        duration in 1u32..=240,
        early in 0u32..=60,
        mut offsets in prop::collection::vec(-600i64..=600, 2..40),
    ) {
        let meeting = Meeting::single(base(), duration, "UTC").with_early_join_minutes(early);
        let occurrence = Occurrence::new("occ", base(), duration);
        offsets.sort_unstable();

        let mut previous = 0u8;
        for offset in offsets {
            let now = base() + Duration::minutes(offset);
            let state = occurrence_join_state(&meeting, &occurrence, now);
            prop_assert!(rank(state) >= previous, "state went backwards at {}", offset);
            prop_assert!(!(state.can_join() && state.has_ended()));
            previous = rank(state);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: the full sequence from far past to far future visits all three states
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn far_past_to_far_future_visits_every_state(
        duration in 1u32..=240,
        early in 0u32..=60,
    ) {
        let meeting = Meeting::single(base(), duration, "UTC").with_early_join_minutes(early);
        let occurrence = Occurrence::new("occ", base(), duration);

        let mut collapsed: Vec<JoinState> = (-2000i64..=2000)
            .map(|m| occurrence_join_state(&meeting, &occurrence, base() + Duration::minutes(m)))
            .collect();
        collapsed.dedup();

        prop_assert_eq!(
            collapsed,
            vec![JoinState::NotYetOpen, JoinState::Joinable, JoinState::Ended]
        );
    }
}

// ---------------------------------------------------------------------------
// Property 3: current/next resolution is idempotent and order-independent
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn current_or_next_is_stable(
        starts in prop::collection::btree_set(-20i64..=20, 0..8),
        cancelled in prop::collection::vec(any::<bool>(), 8),
        now_offset in -30i64..=30,
    ) {
        let rule: RecurrenceRule = serde_json::from_str(r#"{"type":1}"#).unwrap();
        let occurrences: Vec<Occurrence> = starts
            .iter()
            .zip(cancelled.iter())
            .map(|(day, is_cancelled)| {
                let start = base() + Duration::days(*day);
                let occurrence = Occurrence::new(start.timestamp_millis().to_string(), start, 30);
                if *is_cancelled { occurrence.cancelled() } else { occurrence }
            })
            .collect();
        let mut reversed = occurrences.clone();
        reversed.reverse();

        let meeting = Meeting::single(base(), 30, "UTC").with_recurrence(rule.clone(), occurrences);
        let flipped = Meeting::single(base(), 30, "UTC").with_recurrence(rule, reversed);
        let now = base() + Duration::days(now_offset);

        let first = current_or_next_occurrence(&meeting, now);
        prop_assert_eq!(first, current_or_next_occurrence(&meeting, now));
        prop_assert_eq!(first, current_or_next_occurrence(&flipped, now));
        if let Some(occurrence) = first {
            prop_assert!(!occurrence.is_cancelled);
            prop_assert!(occurrence.end_time() + Duration::minutes(40) >= now);
        }
    }
}
