//! RSVP resolution -- collapses each participant's RSVP history into one
//! effective answer per occurrence, then tallies the answers.
//!
//! A participant's records are scanned newest first (by `updated_at`, falling
//! back to `created_at`) and the first record that applies to the occurrence
//! wins:
//!
//! - `all` always applies
//! - `single` applies only to the occurrence it names
//! - `following` applies to occurrences starting at or after the record's `created_at`
//!
//! Records that do not apply are skipped and never block older ones. A newer
//! `all` record therefore overrides older, narrower answers, while a newer
//! `single` or `following` record overrides an older `all` for the occurrences
//! it covers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{normalize_occurrence_id, Occurrence, RsvpRecord, RsvpResponse, RsvpScope};

/// Tally of effective RSVPs for one occurrence (or a non-recurring meeting).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RsvpCounts {
    pub accepted: u32,
    pub declined: u32,
    pub maybe: u32,
    /// Participants with an applicable RSVP, not raw record count.
    pub total: u32,
}

impl RsvpCounts {
    fn record(&mut self, response: RsvpResponse) {
        match response {
            RsvpResponse::Accepted => self.accepted += 1,
            RsvpResponse::Declined => self.declined += 1,
            RsvpResponse::Maybe => self.maybe += 1,
        }
        self.total += 1;
    }
}

/// Records ordered most recent first. Equal timestamps keep their input order.
/// The input is left untouched.
pub fn sorted_by_recency<'a, I>(records: I) -> Vec<&'a RsvpRecord>
where
    I: IntoIterator<Item = &'a RsvpRecord>,
{
    let mut sorted: Vec<&RsvpRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| b.last_modified().cmp(&a.last_modified()));
    sorted
}

/// Whether `record` covers `occurrence`.
fn applies_to(record: &RsvpRecord, occurrence: &Occurrence) -> bool {
    match record.scope {
        RsvpScope::All => true,
        RsvpScope::Single => match record.occurrence_id.as_deref() {
            Some(id) => {
                normalize_occurrence_id(id) == normalize_occurrence_id(&occurrence.occurrence_id)
            }
            None => {
                tracing::debug!(
                    username = %record.username,
                    "single-scope RSVP without occurrence_id is ignored"
                );
                false
            }
        },
        RsvpScope::Following => record.created_at <= occurrence.start_time,
    }
}

/// The one record that decides `records`' owner's answer for `occurrence`.
///
/// `records` must all belong to one participant. Pass `None` as the occurrence
/// for a non-recurring meeting, where the most recent record wins regardless of
/// scope.
pub fn applicable_rsvp<'a>(
    records: &[&'a RsvpRecord],
    occurrence: Option<&Occurrence>,
) -> Option<&'a RsvpRecord> {
    let sorted = sorted_by_recency(records.iter().copied());

    match occurrence {
        None => sorted.first().copied(),
        Some(occurrence) => sorted.into_iter().find(|r| applies_to(r, occurrence)),
    }
}

/// Effective record per participant, keyed by username. Participants with no
/// applicable record are absent.
pub fn effective_rsvps<'a>(
    occurrence: Option<&Occurrence>,
    rsvps: &'a [RsvpRecord],
) -> BTreeMap<&'a str, &'a RsvpRecord> {
    let mut by_user: BTreeMap<&str, Vec<&RsvpRecord>> = BTreeMap::new();
    for record in rsvps {
        by_user.entry(record.username.as_str()).or_default().push(record);
    }

    by_user
        .into_iter()
        .filter_map(|(username, records)| {
            applicable_rsvp(&records, occurrence).map(|record| (username, record))
        })
        .collect()
}

/// Count effective RSVPs for `occurrence` (`None` for a non-recurring meeting).
pub fn calculate_rsvp_counts(occurrence: Option<&Occurrence>, rsvps: &[RsvpRecord]) -> RsvpCounts {
    let mut counts = RsvpCounts::default();
    if rsvps.is_empty() {
        return counts;
    }

    for record in effective_rsvps(occurrence, rsvps).values() {
        counts.record(record.response);
    }
    counts
}
