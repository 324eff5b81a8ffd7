//! Display phase and join eligibility for a single session.
//!
//! Both are derived from status, timing and capacity; the join check also
//! consults the user's quota snapshot.

use serde::Serialize;

use crate::quota::{PlanFlags, QuotaAction, QuotaEvaluator, QuotaSnapshot};
use crate::session::{SessionRecord, SessionStatus};
use crate::timing::SessionTiming;
use crate::types::DbId;

/// Badge shown on a session card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Draft,
    Canceled,
    Finished,
    Ongoing,
    Locked,
    Full,
    Open,
    /// Any status the client does not know about.
    Scheduled,
}

impl SessionPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Canceled => "canceled",
            Self::Finished => "finished",
            Self::Ongoing => "ongoing",
            Self::Locked => "locked",
            Self::Full => "full",
            Self::Open => "open",
            Self::Scheduled => "scheduled",
        }
    }
}

/// Derive the display phase. Status wins over timing for draft and
/// canceled sessions; a session that has ended reads as finished whatever
/// its status.
pub fn session_phase(session: &SessionRecord, timing: &SessionTiming) -> SessionPhase {
    match session.status() {
        SessionStatus::Canceled => return SessionPhase::Canceled,
        SessionStatus::Draft => return SessionPhase::Draft,
        SessionStatus::Finished => return SessionPhase::Finished,
        _ => {}
    }

    if timing.is_past && !timing.is_ongoing {
        return SessionPhase::Finished;
    }
    if timing.is_ongoing {
        return SessionPhase::Ongoing;
    }

    match session.status() {
        SessionStatus::Locked => SessionPhase::Locked,
        _ if session.is_full() => SessionPhase::Full,
        SessionStatus::Open => SessionPhase::Open,
        _ => SessionPhase::Scheduled,
    }
}

/// Why a user cannot join a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum JoinBlocker {
    AlreadyJoined,
    NotOpen { status: String },
    Started,
    Full,
    PlanRestricted,
    QuotaReached { used: u64, limit: u64 },
}

/// Check whether `user_id` may join `session` right now.
///
/// Joining is allowed only for open sessions that have not started, still
/// have room, and when the user's join quota is not exhausted.
pub fn join_eligibility(
    session: &SessionRecord,
    timing: &SessionTiming,
    user_id: DbId,
    quotas: &QuotaSnapshot,
    evaluator: &QuotaEvaluator,
) -> Result<(), JoinBlocker> {
    if session.has_participant(user_id) {
        return Err(JoinBlocker::AlreadyJoined);
    }

    let status = session.status();
    if status != SessionStatus::Open {
        return Err(JoinBlocker::NotOpen {
            status: status.to_string(),
        });
    }

    if timing.is_past || timing.is_ongoing {
        return Err(JoinBlocker::Started);
    }

    if session.is_full() {
        return Err(JoinBlocker::Full);
    }

    let flags = PlanFlags::from_quotas(quotas);
    if evaluator.can_perform(QuotaAction::JoinSession, quotas, &flags) {
        return Ok(());
    }

    match quotas.limit(QuotaAction::JoinSession).ceiling() {
        Some(limit) => Err(JoinBlocker::QuotaReached {
            used: quotas.used(QuotaAction::JoinSession),
            limit,
        }),
        None => Err(JoinBlocker::PlanRestricted),
    }
}
