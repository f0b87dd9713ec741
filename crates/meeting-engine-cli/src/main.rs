//! `meetings` CLI: recurrence encoding, occurrence resolution, join windows, and
//! RSVP tallies from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Encode a form selection into the provider's recurrence rule
//! meetings encode --kind weekly --start-date 2026-06-01 --days mon,wed --end-times 5
//!
//! # Classify and describe a stored rule
//! meetings decode -i rule.json
//! meetings summarize -i rule.json --timezone Europe/Berlin
//!
//! # Which occurrence matters now, and can it be joined?
//! meetings next -i meeting.json --now 2026-03-09T12:55:00Z
//! meetings next -i meeting.json --upcoming 3
//! meetings join -i meeting.json
//!
//! # Effective RSVP tally for one occurrence
//! meetings rsvp -i rsvps.json --occurrence 1773061200000
//!
//! # Materialize occurrences from a meeting's recurrence rule
//! meetings expand -i meeting.json --limit 20
//! ```
//!
//! JSON goes to stdout; logs go to stderr (`RUST_LOG` or `--verbose`).

use std::collections::BTreeMap;
use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use meeting_engine::expander::DEFAULT_EXPANSION_LIMIT;
use meeting_engine::occurrences::OccurrenceSet;
use meeting_engine::{
    calculate_rsvp_counts, current_or_next_occurrence, decode_recurrence, effective_rsvps,
    encode_recurrence, join_status, materialize_occurrences, summarize_recurrence, Meeting,
    RecurrenceEnd, RecurrenceKind, RecurrenceRequest, RecurrenceRule, RsvpCounts, RsvpRecord,
    RsvpResponse,
};

#[derive(Parser)]
#[command(
    name = "meetings",
    version,
    about = "Recurring meeting scheduling and RSVP resolution"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode recurrence form fields into a provider rule (JSON)
    Encode {
        /// none, daily, weekly, weekdays, monthly_day, monthly_nth, monthly_last
        #[arg(long)]
        kind: RecurrenceKind,
        /// Meeting start date in its own timezone (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        start_date: NaiveDate,
        #[arg(long, default_value_t = 1)]
        interval: u32,
        /// Comma-separated weekdays for --kind weekly (e.g. mon,wed)
        #[arg(long, value_delimiter = ',', value_parser = parse_weekday)]
        days: Vec<Weekday>,
        /// Day of month for --kind monthly_day (defaults to the start date's day)
        #[arg(long)]
        monthly_day: Option<u32>,
        /// End after this many occurrences
        #[arg(long, conflicts_with = "end_date")]
        end_times: Option<u32>,
        /// End at this instant (RFC 3339)
        #[arg(long, value_parser = parse_instant)]
        end_date: Option<DateTime<Utc>>,
    },
    /// Classify a provider rule as a form recurrence kind
    Decode {
        /// Rule JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Describe a provider rule in words
    Summarize {
        /// Rule JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// IANA timezone for rendering the end date
        #[arg(long, default_value = "UTC")]
        timezone: String,
    },
    /// Print the occurrence that is joinable now, or the next one
    Next {
        /// Meeting JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Evaluate at this instant instead of the current time (RFC 3339)
        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,
        /// List up to N occurrences starting after now instead
        #[arg(long, value_name = "N")]
        upcoming: Option<usize>,
    },
    /// Print the join state and window of a meeting
    Join {
        /// Meeting JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Evaluate at this instant instead of the current time (RFC 3339)
        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,
    },
    /// Tally effective RSVPs for one occurrence
    Rsvp {
        /// JSON file with `meeting` and `rsvps` (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Occurrence to tally (defaults to the current-or-next occurrence)
        #[arg(long)]
        occurrence: Option<String>,
        /// Evaluate at this instant instead of the current time (RFC 3339)
        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,
    },
    /// Materialize occurrences from a meeting's recurrence rule
    Expand {
        /// Meeting JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        #[arg(long, default_value_t = DEFAULT_EXPANSION_LIMIT)]
        limit: u16,
    },
}

#[derive(Deserialize)]
struct RsvpInput {
    meeting: Meeting,
    #[serde(default)]
    rsvps: Vec<RsvpRecord>,
}

#[derive(Serialize)]
struct RsvpOutput<'a> {
    occurrence_id: Option<&'a str>,
    counts: RsvpCounts,
    effective: BTreeMap<&'a str, RsvpResponse>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Encode {
            kind,
            start_date,
            interval,
            days,
            monthly_day,
            end_times,
            end_date,
        } => {
            let end = match (end_times, end_date) {
                (Some(count), _) => RecurrenceEnd::Count(count),
                (None, Some(until)) => RecurrenceEnd::Until(until),
                (None, None) => RecurrenceEnd::Never,
            };
            let mut request = RecurrenceRequest::new(kind, start_date)
                .with_interval(interval)
                .with_weekly_days(days)
                .with_end(end);
            if let Some(day) = monthly_day {
                request = request.with_monthly_day(day);
            }

            let rule = encode_recurrence(&request).context("Failed to encode recurrence")?;
            print_json(&rule)?;
        }
        Commands::Decode { input } => {
            let rule: RecurrenceRule = read_json(input.as_deref())?;
            print_json(&decode_recurrence(Some(&rule)))?;
        }
        Commands::Summarize { input, timezone } => {
            let rule: RecurrenceRule = read_json(input.as_deref())?;
            print_json(&summarize_recurrence(&rule, &timezone))?;
        }
        Commands::Next {
            input,
            now,
            upcoming,
        } => {
            let meeting: Meeting = read_json(input.as_deref())?;
            let now = now.unwrap_or_else(Utc::now);
            match upcoming {
                Some(limit) => {
                    print_json(&OccurrenceSet::of_meeting(&meeting).upcoming(now, limit))?
                }
                None => print_json(&current_or_next_occurrence(&meeting, now))?,
            }
        }
        Commands::Join { input, now } => {
            let meeting: Meeting = read_json(input.as_deref())?;
            let now = now.unwrap_or_else(Utc::now);
            print_json(&join_status(&meeting, now))?;
        }
        Commands::Rsvp {
            input,
            occurrence,
            now,
        } => {
            let RsvpInput { meeting, rsvps } = read_json(input.as_deref())?;
            let now = now.unwrap_or_else(Utc::now);

            let target = match occurrence.as_deref() {
                Some(id) => match meeting.find_occurrence(id) {
                    Some(found) => Some(found),
                    None => bail!("No occurrence with id '{}'", id),
                },
                None if meeting.is_recurring() => {
                    match current_or_next_occurrence(&meeting, now) {
                        Some(found) => Some(found),
                        None => bail!("Meeting series has no current or upcoming occurrence"),
                    }
                }
                None => None,
            };

            tracing::debug!(
                occurrence = target.map(|o| o.occurrence_id.as_str()),
                records = rsvps.len(),
                "tallying rsvps"
            );
            let effective = effective_rsvps(target, &rsvps);
            let output = RsvpOutput {
                occurrence_id: target.map(|o| o.occurrence_id.as_str()),
                counts: calculate_rsvp_counts(target, &rsvps),
                effective: effective
                    .iter()
                    .map(|(user, record)| (*user, record.response))
                    .collect(),
            };
            print_json(&output)?;
        }
        Commands::Expand { input, limit } => {
            let meeting: Meeting = read_json(input.as_deref())?;
            let Some(rule) = meeting.recurrence.as_ref() else {
                bail!("Meeting has no recurrence rule");
            };
            let Some(start) = meeting.start_time else {
                bail!("Meeting has no start_time");
            };

            let occurrences = materialize_occurrences(
                rule,
                start,
                &meeting.timezone,
                meeting.duration_minutes,
                limit,
            )
            .context("Failed to expand recurrence")?;
            tracing::debug!(count = occurrences.len(), "expanded recurrence");
            print_json(&occurrences)?;
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("Invalid date '{}': {}", s, e))
}

fn parse_instant(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid RFC 3339 datetime '{}': {}", s, e))
}

fn parse_weekday(s: &str) -> std::result::Result<Weekday, String> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| format!("Invalid weekday '{}'", s))
}

fn read_json<T: serde::de::DeserializeOwned>(path: Option<&str>) -> Result<T> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).context("Failed to parse input JSON")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
