//! Natural-language summaries of recurrence rules, e.g.
//! "Every 2 weeks on Monday, Wednesday, for 5 occurrences".

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::recurrence::{
    Frequency, MonthlyRule, RecurrenceEnd, RecurrencePattern, RecurrenceRule,
};
use crate::timezone::local_date;

const ONE_TIME_MEETING: &str = "One-time meeting";
const NO_DAYS_SELECTED: &str = "No days selected";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSummary {
    pub description: String,
    pub end_description: String,
    pub full_summary: String,
}

impl RecurrenceSummary {
    fn new(description: String, end_description: String) -> Self {
        let full_summary = if description.is_empty() || end_description.is_empty() {
            description.clone()
        } else {
            format!("{}, {}", description, end_description)
        };
        Self {
            description,
            end_description,
            full_summary,
        }
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Summarize a wire rule. An until-date is rendered in `timezone`.
///
/// A rule capped at a single occurrence is always "One-time meeting", whatever
/// its type. A weekly rule whose days all fail to parse reads "No days
/// selected". Any other rule that cannot be described yields an empty summary.
pub fn summarize_recurrence(rule: &RecurrenceRule, timezone: &str) -> RecurrenceSummary {
    if rule.end_times == Some(1) {
        return RecurrenceSummary::new(ONE_TIME_MEETING.to_string(), String::new());
    }

    let pattern = match RecurrencePattern::from_rule(rule) {
        Ok(pattern) => pattern,
        Err(err) => {
            if rule.weekly_day_set().is_some_and(|days| days.is_empty()) {
                return RecurrenceSummary::new(NO_DAYS_SELECTED.to_string(), String::new());
            }
            tracing::debug!(error = %err, "recurrence rule cannot be summarized");
            return RecurrenceSummary::default();
        }
    };

    RecurrenceSummary::new(describe(&pattern), describe_end(pattern.end(), timezone))
}

fn describe(pattern: &RecurrencePattern) -> String {
    let n = pattern.repeat_interval();
    match pattern.frequency() {
        Frequency::Daily if n == 1 => "Daily".to_string(),
        Frequency::Daily => format!("Every {} days", n),
        Frequency::Weekly(days) if days.is_weekdays() && n == 1 => "Every weekday".to_string(),
        Frequency::Weekly(days) => {
            let names = days.iter().map(weekday_name).collect::<Vec<_>>().join(", ");
            if n == 1 {
                format!("Weekly on {}", names)
            } else {
                format!("Every {} weeks on {}", n, names)
            }
        }
        Frequency::Monthly(monthly) => {
            let target = match monthly {
                MonthlyRule::DayOfMonth(day) => format!("day {}", day),
                MonthlyRule::DayOfWeek { week, weekday } => {
                    format!("the {} {}", week.label(), weekday_name(weekday))
                }
            };
            if n == 1 {
                format!("Monthly on {}", target)
            } else {
                format!("Every {} months on {}", n, target)
            }
        }
    }
}

fn describe_end(end: RecurrenceEnd, timezone: &str) -> String {
    match end {
        RecurrenceEnd::Never => String::new(),
        RecurrenceEnd::Count(count) => format!("for {} occurrences", count),
        RecurrenceEnd::Until(until) => {
            format!("until {}", local_date(until, timezone).value.format("%b %-d, %Y"))
        }
    }
}
