//! Session list filters (the all / open / finished / full tabs).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::CoreError;
use crate::session::{SessionRecord, SessionStatus};
use crate::timing::{SessionTiming, TimingResolver};
use crate::types::Timestamp;

/// Filter category for session listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFilter {
    #[default]
    All,
    Open,
    Finished,
    Full,
}

impl SessionFilter {
    pub const ALL: [SessionFilter; 4] = [Self::All, Self::Open, Self::Finished, Self::Full];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Open => "open",
            Self::Finished => "finished",
            Self::Full => "full",
        }
    }
}

impl FromStr for SessionFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "open" => Ok(Self::Open),
            "finished" => Ok(Self::Finished),
            "full" => Ok(Self::Full),
            other => Err(CoreError::Validation(format!(
                "Invalid session filter '{other}'. Must be one of: all, open, finished, full"
            ))),
        }
    }
}

impl fmt::Display for SessionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a session given timing that was resolved for this same call.
pub fn matches_with_timing(
    session: &SessionRecord,
    timing: &SessionTiming,
    filter: SessionFilter,
) -> bool {
    match filter {
        SessionFilter::All => true,
        SessionFilter::Open => {
            !timing.is_past && !session.status().is_closed() && !session.is_full()
        }
        SessionFilter::Finished => {
            session.status() == SessionStatus::Finished || (timing.is_past && !timing.is_ongoing)
        }
        SessionFilter::Full => session.is_full(),
    }
}

/// Whether `session` belongs under `filter`. Timing is recomputed against the
/// resolver's clock on every call.
pub fn matches_filter<C: Clock>(
    session: &SessionRecord,
    filter: SessionFilter,
    resolver: &TimingResolver<C>,
) -> bool {
    let timing = resolver.resolve(session);
    matches_with_timing(session, &timing, filter)
}

/// Sessions matching `filter`, in input order.
pub fn filter_sessions<'a, C: Clock>(
    sessions: &'a [SessionRecord],
    filter: SessionFilter,
    resolver: &TimingResolver<C>,
) -> Vec<&'a SessionRecord> {
    let now = resolver.now();
    sessions
        .iter()
        .filter(|session| {
            let timing = resolver.resolve_at(session, now);
            matches_with_timing(session, &timing, filter)
        })
        .collect()
}

/// Badge counts for each filter tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub all: usize,
    pub open: usize,
    pub finished: usize,
    pub full: usize,
}

/// Count sessions per filter, evaluating every session at one instant.
pub fn count_by_filter<C: Clock>(
    sessions: &[SessionRecord],
    resolver: &TimingResolver<C>,
) -> FilterCounts {
    let now = resolver.now();
    let mut counts = FilterCounts::default();

    for session in sessions {
        let timing = resolver.resolve_at(session, now);
        counts.all += 1;
        if matches_with_timing(session, &timing, SessionFilter::Open) {
            counts.open += 1;
        }
        if matches_with_timing(session, &timing, SessionFilter::Finished) {
            counts.finished += 1;
        }
        if matches_with_timing(session, &timing, SessionFilter::Full) {
            counts.full += 1;
        }
    }

    counts
}

/// Order sessions by start instant, earliest first. Sessions whose start
/// cannot be resolved go last; ties keep input order.
pub fn sort_by_start<C: Clock>(sessions: &mut [SessionRecord], resolver: &TimingResolver<C>) {
    sessions.sort_by(|a, b| compare_starts(resolver.resolve_start(a), resolver.resolve_start(b)));
}

/// Compare two optional starts with unresolved values last.
pub fn compare_starts(a: Option<Timestamp>, b: Option<Timestamp>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
