//! Join-window evaluation.
//!
//! Each occurrence (or the single instance of a non-recurring meeting) is in one
//! of three states, computed purely from `now`:
//!
//! ```text
//!   NOT_YET_OPEN  now <  start - early_join
//!   JOINABLE      start - early_join <= now <= start + duration + 40min
//!   ENDED         now >  start + duration + 40min
//! ```
//!
//! Window arithmetic is done on absolute instants. The meeting's timezone only
//! affects how the window is rendered in [`JoinStatus`].

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Meeting, Occurrence};
use crate::occurrences::OccurrenceSet;
use crate::timezone::timezone_or_utc;

/// Minutes before the start at which joining opens, unless the meeting overrides it.
pub const DEFAULT_EARLY_JOIN_MINUTES: u32 = 10;

/// Minutes after the scheduled end during which the meeting is still joinable.
pub const POST_END_GRACE_MINUTES: i64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinState {
    NotYetOpen,
    Joinable,
    Ended,
}

impl JoinState {
    pub fn can_join(self) -> bool {
        self == JoinState::Joinable
    }

    pub fn has_ended(self) -> bool {
        self == JoinState::Ended
    }
}

/// The closed interval `[opens_at, closes_at]` during which joining is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinWindow {
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

impl JoinWindow {
    pub fn for_slot(start: DateTime<Utc>, duration_minutes: u32, early_join_minutes: u32) -> Self {
        Self {
            opens_at: start - Duration::minutes(i64::from(early_join_minutes)),
            closes_at: start
                + Duration::minutes(i64::from(duration_minutes) + POST_END_GRACE_MINUTES),
        }
    }

    pub fn for_occurrence(occurrence: &Occurrence, early_join_minutes: u32) -> Self {
        Self::for_slot(
            occurrence.start_time,
            occurrence.duration_minutes,
            early_join_minutes,
        )
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> JoinState {
        if now < self.opens_at {
            JoinState::NotYetOpen
        } else if now <= self.closes_at {
            JoinState::Joinable
        } else {
            JoinState::Ended
        }
    }
}

/// State of one occurrence of `meeting` at `now`.
pub fn occurrence_join_state(
    meeting: &Meeting,
    occurrence: &Occurrence,
    now: DateTime<Utc>,
) -> JoinState {
    JoinWindow::for_occurrence(occurrence, meeting.early_join_minutes).state_at(now)
}

pub fn can_join_occurrence(meeting: &Meeting, occurrence: &Occurrence, now: DateTime<Utc>) -> bool {
    occurrence_join_state(meeting, occurrence, now).can_join()
}

pub fn has_occurrence_ended(
    meeting: &Meeting,
    occurrence: &Occurrence,
    now: DateTime<Utc>,
) -> bool {
    occurrence_join_state(meeting, occurrence, now).has_ended()
}

/// The slot a caller should care about at `now`.
struct Slot<'a> {
    occurrence: Option<&'a Occurrence>,
    window: JoinWindow,
}

/// For a recurring meeting this is the current-or-next occurrence, or the last
/// active one once the series is over. `None` when nothing is resolvable: no
/// start time, or no active occurrences.
fn resolve_slot(meeting: &Meeting, now: DateTime<Utc>) -> Option<Slot<'_>> {
    if meeting.is_recurring() {
        let set = OccurrenceSet::of_meeting(meeting);
        let occurrence = set
            .current_or_next(meeting.early_join_minutes, now)
            .or_else(|| set.last())?;
        return Some(Slot {
            occurrence: Some(occurrence),
            window: JoinWindow::for_occurrence(occurrence, meeting.early_join_minutes),
        });
    }

    meeting.start_time.map(|start| Slot {
        occurrence: None,
        window: JoinWindow::for_slot(start, meeting.duration_minutes, meeting.early_join_minutes),
    })
}

/// Meeting-level join state at `now`, or `None` when indeterminate.
pub fn join_state(meeting: &Meeting, now: DateTime<Utc>) -> Option<JoinState> {
    resolve_slot(meeting, now).map(|slot| slot.window.state_at(now))
}

/// Whether a participant may join `meeting` at `now`. `false` when indeterminate.
pub fn can_join_meeting(meeting: &Meeting, now: DateTime<Utc>) -> bool {
    join_state(meeting, now).is_some_and(JoinState::can_join)
}

/// Whether `meeting` (for a series: every active occurrence) is over at `now`.
/// `false` when indeterminate.
pub fn has_meeting_ended(meeting: &Meeting, now: DateTime<Utc>) -> bool {
    join_state(meeting, now).is_some_and(JoinState::has_ended)
}

/// Join state plus the window rendered in the meeting's timezone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinStatus {
    pub state: JoinState,
    pub can_join: bool,
    pub has_ended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence_id: Option<String>,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub opens_at_local: NaiveDateTime,
    pub closes_at_local: NaiveDateTime,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone_warning: Option<String>,
}

pub fn join_status(meeting: &Meeting, now: DateTime<Utc>) -> Option<JoinStatus> {
    let slot = resolve_slot(meeting, now)?;
    let state = slot.window.state_at(now);
    let tz = timezone_or_utc(&meeting.timezone);

    Some(JoinStatus {
        state,
        can_join: state.can_join(),
        has_ended: state.has_ended(),
        occurrence_id: slot.occurrence.map(|o| o.occurrence_id.clone()),
        opens_at: slot.window.opens_at,
        closes_at: slot.window.closes_at,
        opens_at_local: slot.window.opens_at.with_timezone(&tz.value).naive_local(),
        closes_at_local: slot.window.closes_at.with_timezone(&tz.value).naive_local(),
        timezone: meeting.timezone.clone(),
        timezone_warning: tz.warning.map(|w| w.to_string()),
    })
}
