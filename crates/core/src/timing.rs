//! Session timing resolution.
//!
//! Derives start/end instants and past/ongoing/future flags from a session's
//! schedule. This is the only place schedule fields are interpreted; every
//! caller goes through [`TimingResolver`].
//!
//! Missing or unparseable fields never produce an error: instants degrade to
//! `None` and all flags to `false`.

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::session::SessionRecord;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Duration assumed when a session has a start but no end.
pub const DEFAULT_SESSION_DURATION_HOURS: i64 = 2;

/// Naive date-time layouts accepted for `start`/`end`, tried in order.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Time-of-day layouts accepted for `start_time`/`end_time`.
const TIME_OF_DAY_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Derived timing of one session at one instant.
///
/// At most one of the three flags is true. All are false when the start
/// could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionTiming {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub is_past: bool,
    pub is_ongoing: bool,
    pub is_future: bool,
}

impl SessionTiming {
    /// Compute the flags for already-resolved instants.
    pub fn at(start: Option<Timestamp>, end: Option<Timestamp>, now: Timestamp) -> Self {
        let is_past = match start {
            Some(start) => now > end.unwrap_or(start),
            None => false,
        };
        let is_ongoing = match (start, end) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        };
        let is_future = start.is_some_and(|start| now < start);

        Self {
            start,
            end,
            is_past,
            is_ongoing,
            is_future,
        }
    }

    /// Whether the start instant could be derived at all.
    pub fn is_resolved(&self) -> bool {
        self.start.is_some()
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolves session schedules against an injected clock.
///
/// Naive date/time fields (no offset) are interpreted in `offset`, which
/// defaults to UTC.
#[derive(Debug, Clone)]
pub struct TimingResolver<C = SystemClock> {
    clock: C,
    offset: FixedOffset,
}

impl Default for TimingResolver<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> TimingResolver<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            offset: utc_offset(),
        }
    }

    /// Interpret naive schedule fields in the given offset.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current instant according to the injected clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Resolve a session against the clock's current instant.
    ///
    /// Reads the clock on every call; results must not be cached across
    /// renders.
    pub fn resolve(&self, session: &SessionRecord) -> SessionTiming {
        self.resolve_at(session, self.clock.now())
    }

    /// Resolve a session at an explicit instant.
    pub fn resolve_at(&self, session: &SessionRecord, now: Timestamp) -> SessionTiming {
        let start = self.resolve_start(session);
        let end = self.resolve_end(session, start);
        if start.is_none() {
            tracing::debug!(session_id = session.id, "Session schedule could not be resolved");
        }
        SessionTiming::at(start, end, now)
    }

    /// Start instant: explicit `start`, else `date` + `start_time`, else
    /// `date` at midnight.
    pub fn resolve_start(&self, session: &SessionRecord) -> Option<Timestamp> {
        if let Some(start) = session
            .start
            .as_deref()
            .and_then(|raw| parse_instant(raw, &self.offset))
        {
            return Some(start);
        }

        let day = parse_calendar_day(session.date.as_deref()?)?;
        match non_empty(session.start_time.as_deref()) {
            Some(raw) => parse_time_of_day(raw).map(|time| self.localize(day.and_time(time))),
            None => Some(self.localize(day.and_time(NaiveTime::MIN))),
        }
    }

    /// End instant: explicit `end`, else `date` + `end_time`, else
    /// `start` + [`DEFAULT_SESSION_DURATION_HOURS`].
    pub fn resolve_end(
        &self,
        session: &SessionRecord,
        start: Option<Timestamp>,
    ) -> Option<Timestamp> {
        if let Some(end) = session
            .end
            .as_deref()
            .and_then(|raw| parse_instant(raw, &self.offset))
        {
            return Some(end);
        }

        let legacy_end = session
            .date
            .as_deref()
            .and_then(parse_calendar_day)
            .zip(non_empty(session.end_time.as_deref()).and_then(parse_time_of_day))
            .map(|(day, time)| self.localize(day.and_time(time)));
        if legacy_end.is_some() {
            return legacy_end;
        }

        start.map(|start| start + Duration::hours(DEFAULT_SESSION_DURATION_HOURS))
    }

    /// Anchor a naive date-time in the resolver's offset.
    pub fn localize(&self, naive: NaiveDateTime) -> Timestamp {
        localize(naive, &self.offset)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse an instant: RFC 3339, a naive date-time, or a bare calendar day
/// (midnight). Naive values are anchored in `offset`.
pub fn parse_instant(raw: &str, offset: &FixedOffset) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|day| day.and_time(NaiveTime::MIN))
        })
        .map(|naive| localize(naive, offset))
}

/// Parse the calendar day of a `date` field.
///
/// Accepts `YYYY-MM-DD` and full ISO timestamps, of which only the day part
/// is used.
pub fn parse_calendar_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = match raw.get(..10) {
        Some(prefix) if raw.len() == 10 || matches!(raw.as_bytes()[10], b'T' | b' ') => prefix,
        _ => return None,
    };
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Parse a `HH:MM[:SS]` time of day.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_OF_DAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

fn localize(naive: NaiveDateTime, offset: &FixedOffset) -> Timestamp {
    match offset.from_local_datetime(&naive).single() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}
