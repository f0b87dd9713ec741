//! WASM bindings for meeting-engine.
//!
//! Exposes recurrence encoding/decoding, summaries, occurrence resolution, join
//! windows, and RSVP tallies to the scheduling UI via `wasm-bindgen`. Meetings,
//! rules, and RSVP lists cross the boundary as JSON strings in the same shape
//! the provider API returns them.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p meeting-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/wasm/ \
//!   target/wasm32-unknown-unknown/release/meeting_engine_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use meeting_engine::recurrence::weekday_from_code;
use meeting_engine::{
    Meeting, RecurrenceEnd, RecurrenceKind, RecurrenceRequest, RecurrenceRule, RsvpRecord,
};

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

/// Recurrence fields as submitted by the scheduling form.
#[derive(Deserialize)]
struct RecurrenceFormInput {
    kind: RecurrenceKind,
    /// `YYYY-MM-DD` in the meeting's timezone.
    start_date: String,
    #[serde(default)]
    repeat_interval: Option<u32>,
    /// Wire weekday codes (1 = Sunday .. 7 = Saturday).
    #[serde(default)]
    weekly_days: Vec<u8>,
    #[serde(default)]
    monthly_day: Option<u32>,
    #[serde(default)]
    end_times: Option<u32>,
    #[serde(default)]
    end_date_time: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 (e.g. "2026-03-09T13:00:00Z") and naive datetimes
/// (e.g. "2026-03-09T13:00:00"), which are interpreted as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))
}

fn parse_json<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn js_err(message: String) -> JsValue {
    JsValue::from_str(&message)
}

fn encode(form_json: &str) -> Result<String, String> {
    let form: RecurrenceFormInput = parse_json("recurrence form", form_json)?;
    let start_date = NaiveDate::parse_from_str(&form.start_date, "%Y-%m-%d")
        .map_err(|e| format!("Invalid start_date '{}': {}", form.start_date, e))?;

    let mut weekly_days = Vec::with_capacity(form.weekly_days.len());
    for code in &form.weekly_days {
        let day =
            weekday_from_code(*code).ok_or_else(|| format!("Invalid weekday code {}", code))?;
        weekly_days.push(day);
    }

    let end = match (form.end_times, form.end_date_time.as_deref()) {
        (Some(count), _) => RecurrenceEnd::Count(count),
        (None, Some(until)) => RecurrenceEnd::Until(parse_datetime(until)?),
        (None, None) => RecurrenceEnd::Never,
    };

    let mut request = RecurrenceRequest::new(form.kind, start_date)
        .with_interval(form.repeat_interval.unwrap_or(1))
        .with_weekly_days(weekly_days)
        .with_end(end);
    if let Some(day) = form.monthly_day {
        request = request.with_monthly_day(day);
    }

    let rule = meeting_engine::encode_recurrence(&request).map_err(|e| e.to_string())?;
    to_json(&rule)
}

fn decode(rule_json: &str) -> Result<String, String> {
    let rule: Option<RecurrenceRule> = parse_json("recurrence", rule_json)?;
    Ok(meeting_engine::decode_recurrence(rule.as_ref()).to_string())
}

fn summarize(rule_json: &str, timezone: &str) -> Result<String, String> {
    let rule: RecurrenceRule = parse_json("recurrence", rule_json)?;
    to_json(&meeting_engine::summarize_recurrence(&rule, timezone))
}

fn current_or_next(meeting_json: &str, now: &str) -> Result<String, String> {
    let meeting: Meeting = parse_json("meeting", meeting_json)?;
    let now = parse_datetime(now)?;
    to_json(&meeting_engine::current_or_next_occurrence(&meeting, now))
}

fn status(meeting_json: &str, now: &str) -> Result<String, String> {
    let meeting: Meeting = parse_json("meeting", meeting_json)?;
    let now = parse_datetime(now)?;
    to_json(&meeting_engine::join_status(&meeting, now))
}

fn rsvp_counts(
    meeting_json: &str,
    occurrence_id: Option<&str>,
    rsvps_json: &str,
) -> Result<String, String> {
    let meeting: Meeting = parse_json("meeting", meeting_json)?;
    let rsvps: Vec<RsvpRecord> = parse_json("rsvps", rsvps_json)?;

    let occurrence = match occurrence_id {
        Some(id) => Some(
            meeting
                .find_occurrence(id)
                .ok_or_else(|| format!("No occurrence with id '{}'", id))?,
        ),
        None => None,
    };

    to_json(&meeting_engine::calculate_rsvp_counts(occurrence, &rsvps))
}

fn materialize(meeting_json: &str, limit: u16) -> Result<String, String> {
    let meeting: Meeting = parse_json("meeting", meeting_json)?;
    let rule = meeting
        .recurrence
        .as_ref()
        .ok_or_else(|| "Meeting has no recurrence rule".to_string())?;
    let start = meeting
        .start_time
        .ok_or_else(|| "Meeting has no start_time".to_string())?;

    let occurrences = meeting_engine::materialize_occurrences(
        rule,
        start,
        &meeting.timezone,
        meeting.duration_minutes,
        limit,
    )
    .map_err(|e| e.to_string())?;
    to_json(&occurrences)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Encode the scheduling form's recurrence fields into a provider rule.
///
/// `form_json` is `{kind, start_date, repeat_interval?, weekly_days?, monthly_day?,
/// end_times?, end_date_time?}` with `weekly_days` as wire codes. Returns the rule
/// as JSON, or `"null"` for `kind: "none"`.
#[wasm_bindgen(js_name = "encodeRecurrence")]
pub fn encode_recurrence(form_json: &str) -> Result<String, JsValue> {
    encode(form_json).map_err(js_err)
}

/// Classify a provider rule (or `null`) as a form recurrence kind, e.g. `"monthly_nth"`.
#[wasm_bindgen(js_name = "decodeRecurrence")]
pub fn decode_recurrence(rule_json: &str) -> Result<String, JsValue> {
    decode(rule_json).map_err(js_err)
}

/// Describe a provider rule in words. Returns
/// `{description, end_description, full_summary}` as JSON.
#[wasm_bindgen(js_name = "summarizeRecurrence")]
pub fn summarize_recurrence(rule_json: &str, timezone: &str) -> Result<String, JsValue> {
    summarize(rule_json, timezone).map_err(js_err)
}

/// The occurrence that is joinable at `now`, or the next one to start, as JSON
/// (`"null"` when there is none).
#[wasm_bindgen(js_name = "getCurrentOrNextOccurrence")]
pub fn get_current_or_next_occurrence(meeting_json: &str, now: &str) -> Result<String, JsValue> {
    current_or_next(meeting_json, now).map_err(js_err)
}

/// Whether a participant may join the meeting at `now`.
#[wasm_bindgen(js_name = "canJoinMeeting")]
pub fn can_join_meeting(meeting_json: &str, now: &str) -> Result<bool, JsValue> {
    let meeting: Meeting = parse_json("meeting", meeting_json).map_err(js_err)?;
    let now = parse_datetime(now).map_err(js_err)?;
    Ok(meeting_engine::can_join_meeting(&meeting, now))
}

/// Whether the meeting (for a series: its last active occurrence) is over at `now`.
#[wasm_bindgen(js_name = "hasMeetingEnded")]
pub fn has_meeting_ended(meeting_json: &str, now: &str) -> Result<bool, JsValue> {
    let meeting: Meeting = parse_json("meeting", meeting_json).map_err(js_err)?;
    let now = parse_datetime(now).map_err(js_err)?;
    Ok(meeting_engine::has_meeting_ended(&meeting, now))
}

/// Join state and window rendered in the meeting's timezone, as JSON.
#[wasm_bindgen(js_name = "getJoinStatus")]
pub fn get_join_status(meeting_json: &str, now: &str) -> Result<String, JsValue> {
    status(meeting_json, now).map_err(js_err)
}

/// Tally effective RSVPs for one occurrence (omit `occurrence_id` for a
/// non-recurring meeting). Returns `{accepted, declined, maybe, total}` as JSON.
#[wasm_bindgen(js_name = "calculateRsvpCounts")]
pub fn calculate_rsvp_counts(
    meeting_json: &str,
    occurrence_id: Option<String>,
    rsvps_json: &str,
) -> Result<String, JsValue> {
    rsvp_counts(meeting_json, occurrence_id.as_deref(), rsvps_json).map_err(js_err)
}

/// Materialize up to `limit` occurrences from the meeting's recurrence rule.
#[wasm_bindgen(js_name = "materializeOccurrences")]
pub fn materialize_occurrences(meeting_json: &str, limit: u16) -> Result<String, JsValue> {
    materialize(meeting_json, limit).map_err(js_err)
}
