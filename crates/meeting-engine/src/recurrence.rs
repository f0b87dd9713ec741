//! Recurrence codec -- translates between the typed [`RecurrencePattern`] edited by
//! the scheduling UI and the compact [`RecurrenceRule`] record exchanged with the
//! meeting provider.
//!
//! All wire-level encoding lives here:
//!
//! - recurrence `type` is `1` (daily), `2` (weekly) or `3` (monthly)
//! - weekday codes are 1-based with Sunday = 1, comma-joined for `weekly_days`
//! - `monthly_week` is one of `1`, `2`, `3`, `4`, or `-1` for the last week
//!
//! The rest of the engine only sees [`RecurrencePattern`] and [`RecurrenceKind`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulingError};

/// `weekly_days` value of the Monday–Friday "weekdays" shortcut.
pub const WEEKDAYS_CODES: &str = "2,3,4,5,6";

/// Provider limits on `repeat_interval`, per recurrence type.
pub const MAX_DAILY_INTERVAL: u32 = 99;
pub const MAX_WEEKLY_INTERVAL: u32 = 50;
pub const MAX_MONTHLY_INTERVAL: u32 = 10;

const TYPE_DAILY: u8 = 1;
const TYPE_WEEKLY: u8 = 2;
const TYPE_MONTHLY: u8 = 3;

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Recurrence rule as persisted and transmitted to the meeting provider.
///
/// Field names match the provider contract exactly. Only this module produces
/// or interprets the raw values; use [`RecurrencePattern::from_rule`] or
/// [`decode_recurrence`] to read one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    #[serde(rename = "type")]
    pub recurrence_type: u8,
    #[serde(default = "default_repeat_interval")]
    pub repeat_interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_days: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_week: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_week_day: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_times: Option<u32>,
}

fn default_repeat_interval() -> u32 {
    1
}

impl RecurrenceRule {
    /// Parsed `weekly_days` of a weekly rule; `None` for other types.
    pub fn weekly_day_set(&self) -> Option<WeekdaySet> {
        (self.recurrence_type == TYPE_WEEKLY)
            .then(|| WeekdaySet::parse_codes(self.weekly_days.as_deref().unwrap_or_default()))
    }
}

// ---------------------------------------------------------------------------
// Weekdays
// ---------------------------------------------------------------------------

/// 1-based weekday code used on the wire (Sunday = 1 ... Saturday = 7).
pub fn weekday_code(day: Weekday) -> u8 {
    day.number_from_sunday() as u8
}

/// Inverse of [`weekday_code`]. Returns `None` outside `1..=7`.
pub fn weekday_from_code(code: u8) -> Option<Weekday> {
    match code {
        1 => Some(Weekday::Sun),
        2 => Some(Weekday::Mon),
        3 => Some(Weekday::Tue),
        4 => Some(Weekday::Wed),
        5 => Some(Weekday::Thu),
        6 => Some(Weekday::Fri),
        7 => Some(Weekday::Sat),
        _ => None,
    }
}

/// A set of weekdays, iterated Sunday first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    /// Monday through Friday.
    pub fn weekdays() -> Self {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
        .into_iter()
        .collect()
    }

    pub fn single(day: Weekday) -> Self {
        WeekdaySet(Self::bit(day))
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_weekdays(&self) -> bool {
        *self == Self::weekdays()
    }

    /// Iterate members in wire order (Sunday first).
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        (1..=7u8)
            .filter_map(weekday_from_code)
            .filter(move |day| self.contains(*day))
    }

    /// Serialize as comma-joined wire codes, e.g. Monday + Wednesday → `"2,4"`.
    pub fn to_codes(&self) -> String {
        self.iter()
            .map(|day| weekday_code(day).to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse comma-joined wire codes. Unparseable or out-of-range tokens are
    /// dropped rather than failing the whole value.
    pub fn parse_codes(codes: &str) -> Self {
        codes
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .filter_map(|token| {
                let day = token.parse::<u8>().ok().and_then(weekday_from_code);
                if day.is_none() {
                    tracing::debug!(token, "dropping unparseable weekday code");
                }
                day
            })
            .collect()
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_sunday()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Ordinal weekday-of-month
// ---------------------------------------------------------------------------

/// Which week of the month a monthly-by-weekday rule targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeekOrdinal {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl WeekOrdinal {
    pub fn from_wire(value: i8) -> Option<Self> {
        match value {
            1 => Some(WeekOrdinal::First),
            2 => Some(WeekOrdinal::Second),
            3 => Some(WeekOrdinal::Third),
            4 => Some(WeekOrdinal::Fourth),
            -1 => Some(WeekOrdinal::Last),
            _ => None,
        }
    }

    pub fn to_wire(self) -> i8 {
        match self {
            WeekOrdinal::First => 1,
            WeekOrdinal::Second => 2,
            WeekOrdinal::Third => 3,
            WeekOrdinal::Fourth => 4,
            WeekOrdinal::Last => -1,
        }
    }

    /// Ordinal for a 1-based week number. Anything past the fourth week can only
    /// be the last one.
    pub fn from_week_number(week: u32) -> Self {
        match week {
            0 | 1 => WeekOrdinal::First,
            2 => WeekOrdinal::Second,
            3 => WeekOrdinal::Third,
            4 => WeekOrdinal::Fourth,
            _ => WeekOrdinal::Last,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WeekOrdinal::First => "1st",
            WeekOrdinal::Second => "2nd",
            WeekOrdinal::Third => "3rd",
            WeekOrdinal::Fourth => "4th",
            WeekOrdinal::Last => "last",
        }
    }
}

/// 1-based ordinal of `date`'s weekday within its month.
///
/// Finds the first day of the month sharing `date`'s weekday, then counts whole
/// weeks from there: the 9th of a month that starts on a Monday is the 2nd Tuesday.
pub fn week_of_month(date: NaiveDate) -> u32 {
    let first_matching_day = (1..=7)
        .find(|day| {
            date.with_day(*day)
                .is_some_and(|d| d.weekday() == date.weekday())
        })
        .unwrap_or(1);
    (date.day() - first_matching_day) / 7 + 1
}

/// Whether `date` falls on the last occurrence of its weekday in the month.
pub fn is_last_week_of_month(date: NaiveDate) -> bool {
    (date + Duration::days(7)).month() != date.month()
}

// ---------------------------------------------------------------------------
// Typed pattern
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthlyRule {
    DayOfMonth(u32),
    DayOfWeek { week: WeekOrdinal, weekday: Weekday },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly(WeekdaySet),
    Monthly(MonthlyRule),
}

impl Frequency {
    fn max_interval(&self) -> u32 {
        match self {
            Frequency::Daily => MAX_DAILY_INTERVAL,
            Frequency::Weekly(_) => MAX_WEEKLY_INTERVAL,
            Frequency::Monthly(_) => MAX_MONTHLY_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecurrenceEnd {
    #[default]
    Never,
    Until(DateTime<Utc>),
    Count(u32),
}

/// A validated recurrence pattern.
///
/// Construct through [`RecurrencePattern::new`] or [`RecurrencePattern::from_rule`];
/// both reject incomplete states so downstream code never probes optional fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrencePattern {
    frequency: Frequency,
    repeat_interval: u32,
    end: RecurrenceEnd,
}

impl RecurrencePattern {
    /// # Errors
    /// Returns `SchedulingError::InvalidPattern` when the interval is zero or above
    /// the provider limit, a weekly pattern selects no days, a day of month is
    /// outside `1..=31`, or an occurrence count is zero.
    pub fn new(frequency: Frequency, repeat_interval: u32, end: RecurrenceEnd) -> Result<Self> {
        if repeat_interval > frequency.max_interval() {
            return Err(SchedulingError::InvalidPattern(format!(
                "repeat interval {} exceeds the maximum of {}",
                repeat_interval,
                frequency.max_interval()
            )));
        }
        Self::checked(frequency, repeat_interval, end)
    }

    /// Structural checks shared by the form path and stored rules. Provider
    /// interval limits are not applied here.
    fn checked(frequency: Frequency, repeat_interval: u32, end: RecurrenceEnd) -> Result<Self> {
        if repeat_interval == 0 {
            return Err(SchedulingError::InvalidPattern(
                "repeat interval must be at least 1".to_string(),
            ));
        }
        match frequency {
            Frequency::Weekly(days) if days.is_empty() => {
                return Err(SchedulingError::InvalidPattern(
                    "weekly pattern needs at least one day".to_string(),
                ));
            }
            Frequency::Monthly(MonthlyRule::DayOfMonth(day)) if !(1..=31).contains(&day) => {
                return Err(SchedulingError::InvalidPattern(format!(
                    "day of month {} is outside 1-31",
                    day
                )));
            }
            _ => {}
        }
        if end == RecurrenceEnd::Count(0) {
            return Err(SchedulingError::InvalidPattern(
                "occurrence count must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            frequency,
            repeat_interval,
            end,
        })
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn repeat_interval(&self) -> u32 {
        self.repeat_interval
    }

    pub fn end(&self) -> RecurrenceEnd {
        self.end
    }

    /// The UI classification of this pattern.
    pub fn kind(&self) -> RecurrenceKind {
        match self.frequency {
            Frequency::Daily => RecurrenceKind::Daily,
            Frequency::Weekly(days) if days.is_weekdays() => RecurrenceKind::Weekdays,
            Frequency::Weekly(_) => RecurrenceKind::Weekly,
            Frequency::Monthly(MonthlyRule::DayOfMonth(_)) => RecurrenceKind::MonthlyDay,
            Frequency::Monthly(MonthlyRule::DayOfWeek {
                week: WeekOrdinal::Last,
                ..
            }) => RecurrenceKind::MonthlyLast,
            Frequency::Monthly(MonthlyRule::DayOfWeek { .. }) => RecurrenceKind::MonthlyNth,
        }
    }

    /// Serialize into the provider's wire record.
    pub fn to_rule(&self) -> RecurrenceRule {
        let mut rule = RecurrenceRule {
            recurrence_type: TYPE_DAILY,
            repeat_interval: self.repeat_interval,
            weekly_days: None,
            monthly_day: None,
            monthly_week: None,
            monthly_week_day: None,
            end_date_time: None,
            end_times: None,
        };

        match self.frequency {
            Frequency::Daily => {}
            Frequency::Weekly(days) => {
                rule.recurrence_type = TYPE_WEEKLY;
                rule.weekly_days = Some(days.to_codes());
            }
            Frequency::Monthly(MonthlyRule::DayOfMonth(day)) => {
                rule.recurrence_type = TYPE_MONTHLY;
                rule.monthly_day = Some(day);
            }
            Frequency::Monthly(MonthlyRule::DayOfWeek { week, weekday }) => {
                rule.recurrence_type = TYPE_MONTHLY;
                rule.monthly_week = Some(week.to_wire());
                rule.monthly_week_day = Some(weekday_code(weekday));
            }
        }

        match self.end {
            RecurrenceEnd::Never => {}
            RecurrenceEnd::Until(until) => rule.end_date_time = Some(until),
            RecurrenceEnd::Count(count) => rule.end_times = Some(count),
        }

        rule
    }

    /// Parse a stored wire record into a pattern.
    ///
    /// Bad weekday tokens are dropped. When both `end_times` and `end_date_time`
    /// are present the count wins. Provider interval limits only bind new
    /// patterns, so a stored rule with any positive interval is accepted.
    ///
    /// # Errors
    /// Returns `SchedulingError::InvalidRule` for an unknown recurrence type or a
    /// monthly rule with neither a usable day nor weekday, and
    /// `SchedulingError::InvalidPattern` if the parsed pattern fails validation.
    pub fn from_rule(rule: &RecurrenceRule) -> Result<Self> {
        let frequency = match rule.recurrence_type {
            TYPE_DAILY => Frequency::Daily,
            TYPE_WEEKLY => Frequency::Weekly(WeekdaySet::parse_codes(
                rule.weekly_days.as_deref().unwrap_or_default(),
            )),
            TYPE_MONTHLY => Frequency::Monthly(monthly_rule(rule).ok_or_else(|| {
                SchedulingError::InvalidRule(
                    "monthly rule needs monthly_day or monthly_week with monthly_week_day"
                        .to_string(),
                )
            })?),
            other => {
                return Err(SchedulingError::InvalidRule(format!(
                    "unknown recurrence type {}",
                    other
                )));
            }
        };

        let end = match (rule.end_times, rule.end_date_time) {
            (Some(count), _) => RecurrenceEnd::Count(count),
            (None, Some(until)) => RecurrenceEnd::Until(until),
            (None, None) => RecurrenceEnd::Never,
        };

        Self::checked(frequency, rule.repeat_interval, end)
    }
}

fn monthly_rule(rule: &RecurrenceRule) -> Option<MonthlyRule> {
    let by_weekday = rule
        .monthly_week
        .and_then(WeekOrdinal::from_wire)
        .zip(rule.monthly_week_day.and_then(weekday_from_code))
        .map(|(week, weekday)| MonthlyRule::DayOfWeek { week, weekday });

    by_weekday.or_else(|| {
        rule.monthly_day
            .filter(|day| (1..=31).contains(day))
            .map(MonthlyRule::DayOfMonth)
    })
}

// ---------------------------------------------------------------------------
// UI classification
// ---------------------------------------------------------------------------

/// The recurrence options offered by the scheduling form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    None,
    Daily,
    Weekly,
    Weekdays,
    MonthlyDay,
    MonthlyNth,
    MonthlyLast,
    /// A wire rule that matches none of the supported shapes.
    Custom,
}

impl RecurrenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecurrenceKind::None => "none",
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Weekdays => "weekdays",
            RecurrenceKind::MonthlyDay => "monthly_day",
            RecurrenceKind::MonthlyNth => "monthly_nth",
            RecurrenceKind::MonthlyLast => "monthly_last",
            RecurrenceKind::Custom => "custom",
        }
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceKind {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(RecurrenceKind::None),
            "daily" => Ok(RecurrenceKind::Daily),
            "weekly" => Ok(RecurrenceKind::Weekly),
            "weekdays" => Ok(RecurrenceKind::Weekdays),
            "monthly_day" => Ok(RecurrenceKind::MonthlyDay),
            "monthly_nth" => Ok(RecurrenceKind::MonthlyNth),
            "monthly_last" => Ok(RecurrenceKind::MonthlyLast),
            "custom" => Ok(RecurrenceKind::Custom),
            other => Err(SchedulingError::InvalidPattern(format!(
                "unknown recurrence kind '{}'",
                other
            ))),
        }
    }
}

/// Classify a wire rule for re-populating the editing form.
///
/// A weekly rule whose days are exactly Monday–Friday comes back as
/// [`RecurrenceKind::Weekdays`]; a monthly rule with `monthly_week == -1` comes
/// back as [`RecurrenceKind::MonthlyLast`]. Rules that fit no supported shape
/// decode to [`RecurrenceKind::Custom`] rather than failing.
pub fn decode_recurrence(rule: Option<&RecurrenceRule>) -> RecurrenceKind {
    let Some(rule) = rule else {
        return RecurrenceKind::None;
    };

    match rule.recurrence_type {
        TYPE_DAILY => RecurrenceKind::Daily,
        TYPE_WEEKLY => {
            let days = WeekdaySet::parse_codes(rule.weekly_days.as_deref().unwrap_or_default());
            if days.is_empty() {
                RecurrenceKind::Custom
            } else if days.is_weekdays() {
                RecurrenceKind::Weekdays
            } else {
                RecurrenceKind::Weekly
            }
        }
        TYPE_MONTHLY => match monthly_rule(rule) {
            Some(MonthlyRule::DayOfWeek {
                week: WeekOrdinal::Last,
                ..
            }) => RecurrenceKind::MonthlyLast,
            Some(MonthlyRule::DayOfWeek { .. }) => RecurrenceKind::MonthlyNth,
            Some(MonthlyRule::DayOfMonth(_)) => RecurrenceKind::MonthlyDay,
            None => RecurrenceKind::Custom,
        },
        _ => RecurrenceKind::Custom,
    }
}

// ---------------------------------------------------------------------------
// Form encoding
// ---------------------------------------------------------------------------

/// The scheduling form's recurrence fields, as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRequest {
    pub kind: RecurrenceKind,
    pub repeat_interval: u32,
    /// The meeting's start date in its own timezone.
    pub start_date: NaiveDate,
    /// Selected days for [`RecurrenceKind::Weekly`]. Empty means the start date's weekday.
    pub weekly_days: Vec<Weekday>,
    /// Day for [`RecurrenceKind::MonthlyDay`]. `None` means the start date's day.
    pub monthly_day: Option<u32>,
    pub end: RecurrenceEnd,
}

impl RecurrenceRequest {
    pub fn new(kind: RecurrenceKind, start_date: NaiveDate) -> Self {
        Self {
            kind,
            repeat_interval: 1,
            start_date,
            weekly_days: Vec::new(),
            monthly_day: None,
            end: RecurrenceEnd::Never,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, repeat_interval: u32) -> Self {
        self.repeat_interval = repeat_interval;
        self
    }

    #[must_use]
    pub fn with_weekly_days(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.weekly_days = days.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_monthly_day(mut self, day: u32) -> Self {
        self.monthly_day = Some(day);
        self
    }

    #[must_use]
    pub fn with_end(mut self, end: RecurrenceEnd) -> Self {
        self.end = end;
        self
    }

    /// Build the typed pattern this request describes, or `None` for a
    /// non-recurring meeting.
    ///
    /// # Errors
    /// Returns `SchedulingError::InvalidPattern` for [`RecurrenceKind::Custom`]
    /// (which has no form representation) or when validation fails.
    pub fn to_pattern(&self) -> Result<Option<RecurrencePattern>> {
        let start = self.start_date;
        let frequency = match self.kind {
            RecurrenceKind::None => return Ok(None),
            RecurrenceKind::Custom => {
                return Err(SchedulingError::InvalidPattern(
                    "custom recurrence cannot be encoded from the form".to_string(),
                ));
            }
            RecurrenceKind::Daily => Frequency::Daily,
            RecurrenceKind::Weekly => {
                let days: WeekdaySet = self.weekly_days.iter().copied().collect();
                if days.is_empty() {
                    Frequency::Weekly(WeekdaySet::single(start.weekday()))
                } else {
                    Frequency::Weekly(days)
                }
            }
            RecurrenceKind::Weekdays => Frequency::Weekly(WeekdaySet::weekdays()),
            RecurrenceKind::MonthlyDay => {
                Frequency::Monthly(MonthlyRule::DayOfMonth(self.monthly_day.unwrap_or(start.day())))
            }
            RecurrenceKind::MonthlyNth => Frequency::Monthly(MonthlyRule::DayOfWeek {
                week: WeekOrdinal::from_week_number(week_of_month(start)),
                weekday: start.weekday(),
            }),
            RecurrenceKind::MonthlyLast => Frequency::Monthly(MonthlyRule::DayOfWeek {
                week: WeekOrdinal::Last,
                weekday: start.weekday(),
            }),
        };

        RecurrencePattern::new(frequency, self.repeat_interval, self.end).map(Some)
    }
}

/// Encode the scheduling form's recurrence fields into a wire rule.
///
/// Returns `Ok(None)` for [`RecurrenceKind::None`]. For the monthly-by-weekday
/// kinds the ordinal and weekday come from `start_date`.
///
/// # Errors
/// See [`RecurrenceRequest::to_pattern`].
pub fn encode_recurrence(request: &RecurrenceRequest) -> Result<Option<RecurrenceRule>> {
    Ok(request.to_pattern()?.map(|pattern| pattern.to_rule()))
}
