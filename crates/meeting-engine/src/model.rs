//! Plain data records the engine consumes: meetings, their occurrences, and RSVPs.
//!
//! These are snapshots owned by the external meeting service. The engine never
//! mutates or persists them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::join_window::DEFAULT_EARLY_JOIN_MINUTES;
use crate::recurrence::RecurrenceRule;

/// One concrete, dated instance of a recurring meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    #[serde(deserialize_with = "occurrence_id_from_any")]
    pub occurrence_id: String,
    pub start_time: DateTime<Utc>,
    #[serde(alias = "duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub is_cancelled: bool,
}

impl Occurrence {
    pub fn new(
        occurrence_id: impl Into<String>,
        start_time: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            occurrence_id: occurrence_id.into(),
            start_time,
            duration_minutes,
            is_cancelled: false,
        }
    }

    #[must_use]
    pub fn cancelled(mut self) -> Self {
        self.is_cancelled = true;
        self
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// A meeting as returned by the meeting service.
///
/// When `recurrence` is absent the meeting is a single instance at `start_time`
/// and `occurrences` is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(alias = "duration")]
    pub duration_minutes: u32,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_early_join_minutes")]
    pub early_join_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_early_join_minutes() -> u32 {
    DEFAULT_EARLY_JOIN_MINUTES
}

impl Meeting {
    /// A non-recurring meeting.
    pub fn single(
        start_time: DateTime<Utc>,
        duration_minutes: u32,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            start_time: Some(start_time),
            duration_minutes,
            timezone: timezone.into(),
            early_join_minutes: DEFAULT_EARLY_JOIN_MINUTES,
            recurrence: None,
            occurrences: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_recurrence(mut self, rule: RecurrenceRule, occurrences: Vec<Occurrence>) -> Self {
        self.recurrence = Some(rule);
        self.occurrences = occurrences;
        self
    }

    #[must_use]
    pub fn with_early_join_minutes(mut self, minutes: u32) -> Self {
        self.early_join_minutes = minutes;
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// The occurrences that belong to this meeting; always empty for a
    /// non-recurring meeting.
    pub fn occurrences(&self) -> &[Occurrence] {
        if self.is_recurring() {
            &self.occurrences
        } else {
            &[]
        }
    }

    /// Look up an occurrence by id, cancelled ones included.
    pub fn find_occurrence(&self, occurrence_id: &str) -> Option<&Occurrence> {
        let wanted = normalize_occurrence_id(occurrence_id);
        self.occurrences()
            .iter()
            .find(|o| normalize_occurrence_id(&o.occurrence_id) == wanted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpResponse {
    Accepted,
    Declined,
    Maybe,
}

/// Temporal breadth of an RSVP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpScope {
    /// One occurrence, named by `occurrence_id`.
    Single,
    /// Every occurrence.
    All,
    /// Occurrences starting at or after the moment the RSVP was made.
    Following,
}

/// One RSVP submission. Later submissions never delete earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsvpRecord {
    pub username: String,
    pub response: RsvpResponse,
    pub scope: RsvpScope,
    #[serde(
        default,
        deserialize_with = "optional_occurrence_id_from_any",
        skip_serializing_if = "Option::is_none"
    )]
    pub occurrence_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RsvpRecord {
    pub fn new(
        username: impl Into<String>,
        response: RsvpResponse,
        scope: RsvpScope,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            username: username.into(),
            response,
            scope,
            occurrence_id: None,
            created_at,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn for_occurrence(mut self, occurrence_id: impl Into<String>) -> Self {
        self.occurrence_id = Some(occurrence_id.into());
        self
    }

    #[must_use]
    pub fn updated(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// `updated_at` when present, otherwise `created_at`.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

/// Occurrence ids compare after trimming surrounding whitespace.
pub fn normalize_occurrence_id(id: &str) -> &str {
    id.trim()
}

/// The provider sends occurrence ids as strings or bare numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum OccurrenceIdRepr {
    Text(String),
    Number(i64),
}

impl OccurrenceIdRepr {
    fn normalize(self) -> String {
        match self {
            OccurrenceIdRepr::Text(s) => normalize_occurrence_id(&s).to_string(),
            OccurrenceIdRepr::Number(n) => n.to_string(),
        }
    }
}

fn occurrence_id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    OccurrenceIdRepr::deserialize(deserializer).map(OccurrenceIdRepr::normalize)
}

fn optional_occurrence_id_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<OccurrenceIdRepr>::deserialize(deserializer)?.map(OccurrenceIdRepr::normalize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurrence_id_accepts_numbers_and_padded_strings() {
        let numeric: Occurrence = serde_json::from_str(
            r#"{"occurrence_id":1772460000000,"start_time":"2026-03-02T14:00:00Z","duration":30}"#,
        )
        .unwrap();
        assert_eq!(numeric.occurrence_id, "1772460000000");
        assert_eq!(numeric.duration_minutes, 30);
        assert!(!numeric.is_cancelled);

        let padded: RsvpRecord = serde_json::from_str(
            r#"{"username":"ana","response":"accepted","scope":"single",
                "occurrence_id":" 42 ","created_at":"2026-03-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(padded.occurrence_id.as_deref(), Some("42"));
    }

    #[test]
    fn meeting_defaults() {
        let meeting: Meeting = serde_json::from_str(r#"{"duration_minutes":45}"#).unwrap();
        assert_eq!(meeting.start_time, None);
        assert_eq!(meeting.timezone, "UTC");
        assert_eq!(meeting.early_join_minutes, DEFAULT_EARLY_JOIN_MINUTES);
        assert!(!meeting.is_recurring());
    }

    #[test]
    fn non_recurring_meeting_ignores_stray_occurrences() {
        let start = "2026-03-02T14:00:00Z".parse().unwrap();
        let mut meeting = Meeting::single(start, 30, "UTC");
        meeting.occurrences.push(Occurrence::new("1", start, 30));
        assert!(meeting.occurrences().is_empty());
    }

    #[test]
    fn find_occurrence_includes_cancelled() {
        let start = "2026-03-04T14:00:00Z".parse().unwrap();
        let rule = RecurrenceRule {
            recurrence_type: 2,
            repeat_interval: 1,
            weekly_days: Some("4".to_string()),
            monthly_day: None,
            monthly_week: None,
            monthly_week_day: None,
            end_date_time: None,
            end_times: None,
        };
        let meeting = Meeting::single(start, 30, "UTC").with_recurrence(
            rule,
            vec![Occurrence::new("1772632800000", start, 30).cancelled()],
        );

        let found = meeting.find_occurrence(" 1772632800000 ").unwrap();
        assert!(found.is_cancelled);
        assert!(meeting.find_occurrence("7").is_none());
    }
}
