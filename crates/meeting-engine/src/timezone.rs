//! IANA timezone resolution with a recoverable fallback.
//!
//! An unknown timezone name never fails a computation: the instant is treated as
//! already-local (UTC) and the degradation is handed back to the caller in
//! [`Localized::warning`], alongside a `tracing` warning.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::error::{Result, SchedulingError};

/// A value computed in some timezone, plus the fallback warning if the timezone
/// could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Localized<T> {
    pub value: T,
    pub warning: Option<SchedulingError>,
}

impl<T> Localized<T> {
    pub fn exact(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Localized<U> {
        Localized {
            value: f(self.value),
            warning: self.warning,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}

/// Parse an IANA timezone name.
///
/// # Errors
/// Returns `SchedulingError::InvalidTimezone` if the name is not a known IANA identifier.
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| SchedulingError::InvalidTimezone(name.to_string()))
}

/// Resolve `name`, falling back to UTC with a warning.
pub fn timezone_or_utc(name: &str) -> Localized<Tz> {
    match resolve_timezone(name) {
        Ok(tz) => Localized::exact(tz),
        Err(err) => {
            tracing::warn!(timezone = name, "unknown timezone, treating instants as local");
            Localized {
                value: Tz::UTC,
                warning: Some(err),
            }
        }
    }
}

/// Wall-clock time of `instant` in `timezone`.
pub fn localize(instant: DateTime<Utc>, timezone: &str) -> Localized<NaiveDateTime> {
    timezone_or_utc(timezone).map(|tz| instant.with_timezone(&tz).naive_local())
}

/// Calendar date of `instant` in `timezone`.
pub fn local_date(instant: DateTime<Utc>, timezone: &str) -> Localized<NaiveDate> {
    localize(instant, timezone).map(|local| local.date())
}
