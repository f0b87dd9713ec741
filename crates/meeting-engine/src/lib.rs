//! # meeting-engine
//!
//! Recurring meeting scheduling and RSVP resolution.
//!
//! A pure, synchronous computation layer: it takes meeting, occurrence, and RSVP
//! snapshots plus a caller-supplied instant, and never performs I/O. Every
//! function is deterministic in its inputs and safe to call from any thread.
//!
//! ## Modules
//!
//! - [`recurrence`]: Recurrence pattern ⇄ provider wire rule, weekday-of-month ordinals
//! - [`summary`]: Natural-language recurrence summaries
//! - [`expander`]: Wire rule → concrete occurrences (DST-aware)
//! - [`occurrences`]: Active occurrence filtering and current/next resolution
//! - [`join_window`]: Not-yet-open / joinable / ended evaluation
//! - [`rsvp`]: Effective RSVP per participant and per-occurrence tallies
//! - [`timezone`]: IANA timezone resolution with UTC fallback
//! - [`model`]: Meeting, occurrence, and RSVP records
//! - [`error`]: Error types

pub mod error;
pub mod expander;
pub mod join_window;
pub mod model;
pub mod occurrences;
pub mod recurrence;
pub mod rsvp;
pub mod summary;
pub mod timezone;

pub use error::SchedulingError;
pub use expander::materialize_occurrences;
pub use join_window::{
    can_join_meeting, has_meeting_ended, join_state, join_status, JoinState, JoinStatus, JoinWindow,
};
pub use model::{Meeting, Occurrence, RsvpRecord, RsvpResponse, RsvpScope};
pub use occurrences::{active_occurrences, current_or_next_occurrence, OccurrenceSet};
pub use recurrence::{
    decode_recurrence, encode_recurrence, RecurrenceEnd, RecurrenceKind, RecurrencePattern,
    RecurrenceRequest, RecurrenceRule,
};
pub use rsvp::{calculate_rsvp_counts, effective_rsvps, RsvpCounts};
pub use summary::{summarize_recurrence, RecurrenceSummary};
