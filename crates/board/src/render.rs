//! Plain-text rendering of the session board.

use sportsync_core::clock::Clock;
use sportsync_core::eligibility::session_phase;
use sportsync_core::filter::{count_by_filter, matches_with_timing, SessionFilter};
use sportsync_core::quota::{usage_label, PlanFlags, QuotaAction, QuotaEvaluator, QuotaSnapshot};
use sportsync_core::session::SessionRecord;
use sportsync_core::timing::TimingResolver;

/// Render the sessions under `filter` followed by the quota banner.
///
/// All sessions are evaluated against a single reading of the clock.
pub fn render_board<C: Clock>(
    sessions: &[SessionRecord],
    quotas: &QuotaSnapshot,
    filter: SessionFilter,
    resolver: &TimingResolver<C>,
    evaluator: &QuotaEvaluator,
) -> String {
    let now = resolver.now();
    let counts = count_by_filter(sessions, resolver);
    let mut out = String::new();

    out.push_str(&format!(
        "Sessions [{filter}] all={} open={} finished={} full={}\n",
        counts.all, counts.open, counts.finished, counts.full
    ));

    let mut shown = 0;
    for session in sessions {
        let timing = resolver.resolve_at(session, now);
        if !matches_with_timing(session, &timing, filter) {
            continue;
        }
        shown += 1;

        let start = timing.start.map_or_else(
            || "unscheduled".to_string(),
            |start| {
                start
                    .with_timezone(&resolver.offset())
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            },
        );
        let spots = match session.spots_left() {
            Some(0) => "no spots left".to_string(),
            Some(1) => "1 spot left".to_string(),
            Some(n) => format!("{n} spots left"),
            None => "no cap".to_string(),
        };
        out.push_str(&format!(
            "  #{:<5} {:<16}  {:<9} {}  ({spots})\n",
            session.id,
            start,
            session_phase(session, &timing).label(),
            session.title.as_deref().unwrap_or("Untitled"),
        ));
    }
    if shown == 0 {
        out.push_str("  (no sessions)\n");
    }

    out.push_str(&format!("Quotas [{} plan]\n", quotas.plan));
    if !quotas.plan_is_active(now) {
        out.push_str("  plan expired\n");
    }
    let flags = PlanFlags::from_quotas(quotas);
    for action in QuotaAction::ALL {
        let marker = if evaluator.can_perform(action, quotas, &flags) {
            ""
        } else {
            "  blocked"
        };
        out.push_str(&format!(
            "  {:<16} {}{marker}\n",
            action.as_str(),
            usage_label(action, quotas)
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use sportsync_core::clock::FixedClock;

    fn resolver() -> TimingResolver<FixedClock> {
        TimingResolver::new(FixedClock(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()))
    }

    fn sessions() -> Vec<SessionRecord> {
        serde_json::from_value(json!([
            {
                "id": 1, "title": "Morning run", "date": "2025-06-01", "start_time": "10:00",
                "status": "OPEN", "max_players": 10, "participants": [1, 2, 3, 4, 5, 6, 7, 8]
            },
            {"id": 2, "title": "Old match", "start": "2025-05-01T10:00:00Z", "status": "FINISHED"},
            {"id": 3, "title": "Padel", "start": "2025-06-02T18:00:00Z", "status": "OPEN", "max_players": 4, "participants_count": 4}
        ]))
        .unwrap()
    }

    fn quotas() -> QuotaSnapshot {
        QuotaSnapshot::from_payload(&json!({
            "plan": "free",
            "limits": {"sessions_create_per_month": 3, "sessions_join_per_month": 5, "can_create_groups": false},
            "usage": {"sessions_created": 3, "sessions_joined": 2}
        }))
    }

    #[test]
    fn open_tab_lists_joinable_sessions() {
        let board = render_board(
            &sessions(),
            &quotas(),
            SessionFilter::Open,
            &resolver(),
            &QuotaEvaluator::default(),
        );
        assert!(board.starts_with("Sessions [open] all=3 open=1 finished=1 full=1"));
        assert!(board.contains("2025-06-01 10:00"));
        assert!(board.contains("Morning run"));
        assert!(board.contains("(2 spots left)"));
        assert!(!board.contains("Old match"));
        assert!(!board.contains("Padel"));
    }

    #[test]
    fn full_tab_shows_full_sessions() {
        let board = render_board(
            &sessions(),
            &quotas(),
            SessionFilter::Full,
            &resolver(),
            &QuotaEvaluator::default(),
        );
        assert!(board.contains("Padel"));
        assert!(board.contains("full"));
        assert!(board.contains("(no spots left)"));
    }

    #[test]
    fn quota_banner_marks_blocked_actions() {
        let board = render_board(
            &sessions(),
            &quotas(),
            SessionFilter::All,
            &resolver(),
            &QuotaEvaluator::default(),
        );
        assert!(board.contains("Quotas [free plan]"));
        assert!(board.contains("create_session   3/3  blocked"));
        assert!(board.contains("join_session     2/5\n"));
        assert!(board.contains("create_group     0/∞  blocked"));
    }

    #[test]
    fn empty_tab_says_so() {
        let board = render_board(
            &[],
            &QuotaSnapshot::default(),
            SessionFilter::Finished,
            &resolver(),
            &QuotaEvaluator::default(),
        );
        assert!(board.contains("(no sessions)"));
    }

    #[test]
    fn every_line_is_terminated() {
        let board = render_board(
            &sessions(),
            &quotas(),
            SessionFilter::All,
            &resolver(),
            &QuotaEvaluator::default(),
        );
        assert!(board.ends_with('\n'));
        assert_eq!(board.lines().count(), 1 + 3 + 1 + QuotaAction::ALL.len());
    }
}
