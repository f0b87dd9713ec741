//! Occurrence filtering and current/next resolution.
//!
//! [`OccurrenceSet`] is a start-ordered view over a meeting's non-cancelled
//! occurrences. [`current_or_next_occurrence`] picks the one occurrence a caller
//! should care about right now.

use chrono::{DateTime, Utc};

use crate::join_window::{JoinState, JoinWindow};
use crate::model::{normalize_occurrence_id, Meeting, Occurrence};

/// Occurrences that are not cancelled, in input order.
pub fn active_occurrences(occurrences: &[Occurrence]) -> Vec<&Occurrence> {
    occurrences.iter().filter(|o| !o.is_cancelled).collect()
}

/// Active occurrences sorted by start time (stable for equal starts).
#[derive(Debug, Clone, Default)]
pub struct OccurrenceSet<'a> {
    active: Vec<&'a Occurrence>,
}

impl<'a> OccurrenceSet<'a> {
    pub fn new(occurrences: &'a [Occurrence]) -> Self {
        let mut active = active_occurrences(occurrences);
        active.sort_by_key(|o| o.start_time);
        Self { active }
    }

    /// Empty for a non-recurring meeting.
    pub fn of_meeting(meeting: &'a Meeting) -> Self {
        Self::new(meeting.occurrences())
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Occurrence> + '_ {
        self.active.iter().copied()
    }

    pub fn first(&self) -> Option<&'a Occurrence> {
        self.active.first().copied()
    }

    pub fn last(&self) -> Option<&'a Occurrence> {
        self.active.last().copied()
    }

    pub fn find(&self, occurrence_id: &str) -> Option<&'a Occurrence> {
        let wanted = normalize_occurrence_id(occurrence_id);
        self.iter()
            .find(|o| normalize_occurrence_id(&o.occurrence_id) == wanted)
    }

    /// Up to `limit` occurrences starting strictly after `now`.
    pub fn upcoming(&self, now: DateTime<Utc>, limit: usize) -> Vec<&'a Occurrence> {
        self.iter()
            .filter(|o| o.start_time > now)
            .take(limit)
            .collect()
    }

    /// The earliest occurrence whose join window is open at `now`; failing that,
    /// the earliest one starting after `now`.
    pub fn current_or_next(
        &self,
        early_join_minutes: u32,
        now: DateTime<Utc>,
    ) -> Option<&'a Occurrence> {
        if self.is_empty() {
            return None;
        }

        self.iter()
            .find(|o| {
                JoinWindow::for_occurrence(o, early_join_minutes).state_at(now)
                    == JoinState::Joinable
            })
            .or_else(|| self.iter().find(|o| o.start_time > now))
    }
}

/// The occurrence of a recurring meeting that is joinable now, or else the next
/// one to start. `None` for a non-recurring meeting, an empty or fully
/// cancelled series, or a series that has fully ended.
pub fn current_or_next_occurrence(meeting: &Meeting, now: DateTime<Utc>) -> Option<&Occurrence> {
    OccurrenceSet::of_meeting(meeting).current_or_next(meeting.early_join_minutes, now)
}
