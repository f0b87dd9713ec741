//! Tests for join-window evaluation.

use chrono::{DateTime, Duration, TimeZone, Utc};
use meeting_engine::join_window::{
    can_join_occurrence, has_occurrence_ended, occurrence_join_state, POST_END_GRACE_MINUTES,
};
use meeting_engine::recurrence::RecurrenceRule;
use meeting_engine::{
    can_join_meeting, has_meeting_ended, join_state, join_status, JoinState, JoinWindow, Meeting,
    Occurrence,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 15, 0, 0).unwrap()
}

fn minutes(n: i64) -> Duration {
    Duration::minutes(n)
}

fn daily_rule() -> RecurrenceRule {
    serde_json::from_str(r#"{"type":1}"#).unwrap()
}

// ---------------------------------------------------------------------------
// Window boundaries
// ---------------------------------------------------------------------------

#[test]
fn window_boundaries_for_thirty_minute_meeting() {
    // early join 10, duration 30, grace 40
    let meeting = Meeting::single(t0(), 30, "UTC");

    assert!(!can_join_meeting(&meeting, t0() - minutes(11)));
    assert!(can_join_meeting(&meeting, t0() - minutes(10)));
    assert!(can_join_meeting(&meeting, t0() + minutes(69)));
    assert!(can_join_meeting(&meeting, t0() + minutes(70)));
    assert!(!can_join_meeting(&meeting, t0() + minutes(71)));

    assert!(!has_meeting_ended(&meeting, t0() + minutes(70)));
    assert!(has_meeting_ended(&meeting, t0() + minutes(71)));
}

#[test]
fn window_edges_are_inclusive() {
    let window = JoinWindow::for_slot(t0(), 30, 10);

    assert_eq!(window.opens_at, t0() - minutes(10));
    assert_eq!(window.closes_at, t0() + minutes(30 + POST_END_GRACE_MINUTES));
    assert_eq!(window.state_at(window.opens_at), JoinState::Joinable);
    assert_eq!(window.state_at(window.closes_at), JoinState::Joinable);
    assert_eq!(
        window.state_at(window.opens_at - Duration::seconds(1)),
        JoinState::NotYetOpen
    );
    assert_eq!(
        window.state_at(window.closes_at + Duration::seconds(1)),
        JoinState::Ended
    );
}

#[test]
fn custom_early_join() {
    let meeting = Meeting::single(t0(), 30, "UTC").with_early_join_minutes(0);

    assert!(!can_join_meeting(&meeting, t0() - minutes(1)));
    assert!(can_join_meeting(&meeting, t0()));
}

#[test]
fn missing_start_time_is_indeterminate() {
    let mut meeting = Meeting::single(t0(), 30, "UTC");
    meeting.start_time = None;

    assert_eq!(join_state(&meeting, t0()), None);
    assert!(!can_join_meeting(&meeting, t0()));
    assert!(!has_meeting_ended(&meeting, t0() + minutes(10_000)));
    assert!(join_status(&meeting, t0()).is_none());
}

#[test]
fn window_math_ignores_timezone() {
    let utc = Meeting::single(t0(), 30, "UTC");
    let tokyo = Meeting::single(t0(), 30, "Asia/Tokyo");
    let broken = Meeting::single(t0(), 30, "Invalid/Zone");

    for offset in [-11, -10, 0, 70, 71] {
        let now = t0() + minutes(offset);
        assert_eq!(join_state(&utc, now), join_state(&tokyo, now));
        assert_eq!(join_state(&utc, now), join_state(&broken, now));
    }
}

// ---------------------------------------------------------------------------
// Occurrences
// ---------------------------------------------------------------------------

#[test]
fn occurrence_uses_its_own_duration() {
    let meeting = Meeting::single(t0(), 30, "UTC");
    let long = Occurrence::new("1", t0(), 120);

    assert_eq!(
        occurrence_join_state(&meeting, &long, t0() + minutes(100)),
        JoinState::Joinable
    );
    assert!(can_join_occurrence(&meeting, &long, t0() + minutes(160)));
    assert!(has_occurrence_ended(&meeting, &long, t0() + minutes(161)));
}

#[test]
fn recurring_meeting_follows_current_occurrence() {
    let day = Duration::days(1);
    let meeting = Meeting::single(t0(), 30, "UTC").with_recurrence(
        daily_rule(),
        vec![
            Occurrence::new("a", t0(), 30),
            Occurrence::new("b", t0() + day, 30),
        ],
    );

    // Between occurrences: next one not open yet.
    assert_eq!(
        join_state(&meeting, t0() + minutes(120)),
        Some(JoinState::NotYetOpen)
    );
    assert!(can_join_meeting(&meeting, t0() + day - minutes(5)));
    assert!(!has_meeting_ended(&meeting, t0() + minutes(120)));

    // After the last occurrence's window.
    assert!(has_meeting_ended(&meeting, t0() + day + minutes(71)));
    assert!(!can_join_meeting(&meeting, t0() + day + minutes(71)));
}

#[test]
fn recurring_meeting_without_active_occurrences_is_indeterminate() {
    let meeting = Meeting::single(t0(), 30, "UTC").with_recurrence(
        daily_rule(),
        vec![Occurrence::new("a", t0(), 30).cancelled()],
    );

    assert_eq!(join_state(&meeting, t0()), None);
    assert!(!can_join_meeting(&meeting, t0()));
    assert!(!has_meeting_ended(&meeting, t0() + Duration::days(30)));

    let empty = Meeting::single(t0(), 30, "UTC").with_recurrence(daily_rule(), vec![]);
    assert_eq!(join_state(&empty, t0()), None);
}

// ---------------------------------------------------------------------------
// Status rendering
// ---------------------------------------------------------------------------

#[test]
fn status_renders_window_in_meeting_timezone() {
    // 15:00 UTC is 11:00 EDT on Mar 16 2026.
    let meeting = Meeting::single(t0(), 30, "America/New_York");

    let status = join_status(&meeting, t0()).expect("resolvable");

    assert_eq!(status.state, JoinState::Joinable);
    assert!(status.can_join);
    assert!(!status.has_ended);
    assert_eq!(status.occurrence_id, None);
    assert_eq!(status.opens_at_local.to_string(), "2026-03-16 10:50:00");
    assert_eq!(status.closes_at_local.to_string(), "2026-03-16 12:10:00");
    assert_eq!(status.timezone_warning, None);
}

#[test]
fn status_reports_timezone_fallback() {
    let meeting = Meeting::single(t0(), 30, "Atlantis/Capital");

    let status = join_status(&meeting, t0()).expect("resolvable");

    assert_eq!(status.opens_at_local.to_string(), "2026-03-16 14:50:00");
    assert!(status
        .timezone_warning
        .as_deref()
        .is_some_and(|w| w.contains("Atlantis/Capital")));
}

#[test]
fn status_names_the_occurrence() {
    let meeting = Meeting::single(t0(), 30, "UTC").with_recurrence(
        daily_rule(),
        vec![Occurrence::new("1773673200000", t0(), 30)],
    );

    let status = join_status(&meeting, t0()).unwrap();
    assert_eq!(status.occurrence_id.as_deref(), Some("1773673200000"));

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["state"], "JOINABLE");
}
