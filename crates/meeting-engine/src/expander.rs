//! Occurrence materialization -- expands a [`RecurrenceRule`] into concrete
//! [`Occurrence`]s.
//!
//! The rule is rewritten as an RFC 5545 RRULE anchored at the meeting's local
//! start time and expanded with the `rrule` crate, so wall-clock times stay fixed
//! across DST transitions.

use chrono::{DateTime, Utc, Weekday};
use rrule::RRuleSet;

use crate::error::{Result, SchedulingError};
use crate::model::Occurrence;
use crate::recurrence::{Frequency, MonthlyRule, RecurrenceEnd, RecurrencePattern, RecurrenceRule};
use crate::timezone::timezone_or_utc;

/// Upper bound on instances produced when the rule has no count of its own.
pub const DEFAULT_EXPANSION_LIMIT: u16 = 500;

fn byday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// RRULE body (without DTSTART) for a pattern. Until-dates are applied after
/// expansion, so only COUNT is carried here.
pub fn to_rrule(pattern: &RecurrencePattern) -> String {
    let interval = pattern.repeat_interval();
    let mut rrule = match pattern.frequency() {
        Frequency::Daily => format!("FREQ=DAILY;INTERVAL={}", interval),
        Frequency::Weekly(days) => {
            let days: Vec<&str> = days.iter().map(byday).collect();
            format!("FREQ=WEEKLY;INTERVAL={};BYDAY={}", interval, days.join(","))
        }
        Frequency::Monthly(MonthlyRule::DayOfMonth(day)) => {
            format!("FREQ=MONTHLY;INTERVAL={};BYMONTHDAY={}", interval, day)
        }
        Frequency::Monthly(MonthlyRule::DayOfWeek { week, weekday }) => format!(
            "FREQ=MONTHLY;INTERVAL={};BYDAY={};BYSETPOS={}",
            interval,
            byday(weekday),
            week.to_wire()
        ),
    };

    if let RecurrenceEnd::Count(count) = pattern.end() {
        rrule.push_str(&format!(";COUNT={}", count));
    }

    rrule
}

/// Expand `rule` starting at `start` into concrete occurrences.
///
/// Occurrence ids are the start instant in epoch milliseconds. At most `limit`
/// occurrences are produced. An unknown `timezone` falls back to UTC.
///
/// # Errors
/// Returns `SchedulingError::InvalidRule` / `InvalidPattern` if the rule cannot be
/// parsed into a supported pattern, and `SchedulingError::Expansion` if the
/// generated RRULE is rejected.
pub fn materialize_occurrences(
    rule: &RecurrenceRule,
    start: DateTime<Utc>,
    timezone: &str,
    duration_minutes: u32,
    limit: u16,
) -> Result<Vec<Occurrence>> {
    let pattern = RecurrencePattern::from_rule(rule)?;
    if limit == 0 {
        return Ok(Vec::new());
    }

    let tz = timezone_or_utc(timezone).value;
    let dtstart_local = start.with_timezone(&tz).naive_local();

    let rrule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:{}",
        tz.name(),
        dtstart_local.format("%Y%m%dT%H%M%S"),
        to_rrule(&pattern)
    );

    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| SchedulingError::Expansion(format!("{}", e)))?;

    let until = match pattern.end() {
        RecurrenceEnd::Until(until) => Some(until),
        _ => None,
    };

    let instances = rrule_set.all(limit);

    Ok(instances
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .take_while(|start| until.is_none_or(|until| *start <= until))
        .map(|start| Occurrence::new(start.timestamp_millis().to_string(), start, duration_minutes))
        .collect())
}
