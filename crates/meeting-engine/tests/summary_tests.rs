//! Tests for natural-language recurrence summaries.

use meeting_engine::recurrence::RecurrenceRule;
use meeting_engine::summarize_recurrence;

fn wire(json: &str) -> RecurrenceRule {
    serde_json::from_str(json).expect("valid wire JSON")
}

#[test]
fn daily() {
    let summary = summarize_recurrence(&wire(r#"{"type":1}"#), "UTC");
    assert_eq!(summary.description, "Daily");
    assert_eq!(summary.end_description, "");
    assert_eq!(summary.full_summary, "Daily");

    let every_three = summarize_recurrence(&wire(r#"{"type":1,"repeat_interval":3}"#), "UTC");
    assert_eq!(every_three.description, "Every 3 days");
}

#[test]
fn biweekly_with_named_days() {
    let summary = summarize_recurrence(
        &wire(r#"{"type":2,"repeat_interval":2,"weekly_days":"2,4"}"#),
        "UTC",
    );
    assert_eq!(summary.description, "Every 2 weeks on Monday, Wednesday");
}

#[test]
fn weekly_days_listed_sunday_first() {
    let summary = summarize_recurrence(&wire(r#"{"type":2,"weekly_days":"7,1"}"#), "UTC");
    assert_eq!(summary.description, "Weekly on Sunday, Saturday");
}

#[test]
fn weekdays_shortcut() {
    let summary = summarize_recurrence(&wire(r#"{"type":2,"weekly_days":"2,3,4,5,6"}"#), "UTC");
    assert_eq!(summary.description, "Every weekday");
}

#[test]
fn weekly_with_no_resolvable_days() {
    let summary = summarize_recurrence(&wire(r#"{"type":2,"weekly_days":"zz,9"}"#), "UTC");
    assert_eq!(summary.description, "No days selected");
    assert_eq!(summary.full_summary, "No days selected");
}

#[test]
fn monthly_nth_and_last() {
    let second_tuesday = summarize_recurrence(
        &wire(r#"{"type":3,"monthly_week":2,"monthly_week_day":3}"#),
        "UTC",
    );
    assert_eq!(second_tuesday.description, "Monthly on the 2nd Tuesday");

    let last_friday = summarize_recurrence(
        &wire(r#"{"type":3,"repeat_interval":2,"monthly_week":-1,"monthly_week_day":6}"#),
        "UTC",
    );
    assert_eq!(last_friday.description, "Every 2 months on the last Friday");
}

#[test]
fn monthly_by_day() {
    let summary = summarize_recurrence(&wire(r#"{"type":3,"monthly_day":15}"#), "UTC");
    assert_eq!(summary.description, "Monthly on day 15");
}

#[test]
fn occurrence_count_end() {
    let summary = summarize_recurrence(
        &wire(r#"{"type":2,"weekly_days":"2","end_times":5}"#),
        "UTC",
    );
    assert_eq!(summary.end_description, "for 5 occurrences");
    assert_eq!(summary.full_summary, "Weekly on Monday, for 5 occurrences");
}

#[test]
fn until_date_rendered_in_meeting_timezone() {
    // 03:00 UTC on Dec 1 is still Nov 30 in Los Angeles.
    let rule = wire(r#"{"type":1,"end_date_time":"2026-12-01T03:00:00Z"}"#);

    let local = summarize_recurrence(&rule, "America/Los_Angeles");
    assert_eq!(local.end_description, "until Nov 30, 2026");
    assert_eq!(local.full_summary, "Daily, until Nov 30, 2026");

    let utc = summarize_recurrence(&rule, "UTC");
    assert_eq!(utc.end_description, "until Dec 1, 2026");
}

#[test]
fn unknown_timezone_still_summarizes() {
    let rule = wire(r#"{"type":1,"end_date_time":"2026-12-01T03:00:00Z"}"#);
    let summary = summarize_recurrence(&rule, "Not/AZone");
    assert_eq!(summary.end_description, "until Dec 1, 2026");
}

#[test]
fn single_occurrence_is_one_time_meeting_for_every_type() {
    for json in [
        r#"{"type":1,"end_times":1}"#,
        r#"{"type":2,"weekly_days":"2,4","end_times":1}"#,
        r#"{"type":3,"monthly_week":2,"monthly_week_day":3,"end_times":1}"#,
    ] {
        let summary = summarize_recurrence(&wire(json), "UTC");
        assert_eq!(summary.description, "One-time meeting", "{}", json);
        assert_eq!(summary.end_description, "");
        assert_eq!(summary.full_summary, "One-time meeting");
    }
}

#[test]
fn undescribable_rule_yields_empty_summary() {
    let summary = summarize_recurrence(&wire(r#"{"type":3}"#), "UTC");
    assert_eq!(summary.description, "");
    assert_eq!(summary.full_summary, "");

    let unknown = summarize_recurrence(&wire(r#"{"type":9}"#), "UTC");
    assert_eq!(unknown, Default::default());
}

#[test]
fn stored_interval_above_form_limit_still_summarizes() {
    let monthly = summarize_recurrence(
        &wire(r#"{"type":3,"repeat_interval":12,"monthly_day":5}"#),
        "UTC",
    );
    assert_eq!(monthly.description, "Every 12 months on day 5");
    assert_eq!(monthly.full_summary, "Every 12 months on day 5");

    let weekly = summarize_recurrence(
        &wire(r#"{"type":2,"repeat_interval":60,"weekly_days":"2"}"#),
        "UTC",
    );
    assert_eq!(weekly.description, "Every 60 weeks on Monday");
}
