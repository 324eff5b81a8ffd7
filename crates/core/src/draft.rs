//! Validation of the "create session" form before it is submitted.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::clock::Clock;
use crate::error::CoreError;
use crate::session::Visibility;
use crate::timing::{parse_calendar_day, parse_time_of_day, TimingResolver};

/// Fields of a session being created by an organizer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionDraft {
    #[validate(length(min = 3, max = 100))]
    pub title: String,
    #[validate(length(min = 1))]
    pub sport: String,
    pub date: String,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[validate(range(min = 2, max = 200))]
    pub max_players: u32,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

/// Validate a draft: field constraints, then schedule coherence against the
/// resolver's clock.
pub fn validate_draft<C: Clock>(
    draft: &SessionDraft,
    resolver: &TimingResolver<C>,
) -> Result<(), CoreError> {
    draft
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let day = parse_calendar_day(&draft.date)
        .ok_or_else(|| CoreError::Validation(format!("Invalid date '{}'", draft.date)))?;
    let start_time = parse_time_of_day(&draft.start_time).ok_or_else(|| {
        CoreError::Validation(format!("Invalid start time '{}'", draft.start_time))
    })?;
    let start = resolver.localize(day.and_time(start_time));

    if start < resolver.now() {
        return Err(CoreError::Validation(
            "Session cannot start in the past".to_string(),
        ));
    }

    if let Some(raw) = draft.end_time.as_deref().filter(|s| !s.trim().is_empty()) {
        let end_time = parse_time_of_day(raw)
            .ok_or_else(|| CoreError::Validation(format!("Invalid end time '{raw}'")))?;
        if end_time <= start_time {
            return Err(CoreError::Validation(
                "End time must be after start time".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn resolver() -> TimingResolver<FixedClock> {
        TimingResolver::new(FixedClock(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()))
    }

    fn draft() -> SessionDraft {
        SessionDraft {
            title: "Sunday five-a-side".to_string(),
            sport: "football".to_string(),
            date: "2025-06-01".to_string(),
            start_time: "10:00".to_string(),
            end_time: Some("11:30".to_string()),
            max_players: 10,
            visibility: Some(Visibility::Public),
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(validate_draft(&draft(), &resolver()).is_ok());
    }

    #[test]
    fn short_title_rejected() {
        let d = SessionDraft {
            title: "ab".to_string(),
            ..draft()
        };
        assert_matches!(validate_draft(&d, &resolver()), Err(CoreError::Validation(_)));
    }

    #[test]
    fn player_bounds() {
        for max_players in [1, 201] {
            let d = SessionDraft {
                max_players,
                ..draft()
            };
            assert_matches!(validate_draft(&d, &resolver()), Err(CoreError::Validation(_)));
        }
    }

    #[test]
    fn past_start_rejected() {
        let d = SessionDraft {
            start_time: "08:00".to_string(),
            ..draft()
        };
        let err = validate_draft(&d, &resolver()).unwrap_err();
        assert!(err.to_string().contains("past"));
    }

    #[test]
    fn end_before_start_rejected() {
        let d = SessionDraft {
            end_time: Some("09:30".to_string()),
            ..draft()
        };
        let err = validate_draft(&d, &resolver()).unwrap_err();
        assert!(err.to_string().contains("after start"));
    }

    #[test]
    fn missing_end_is_allowed() {
        let d = SessionDraft {
            end_time: None,
            ..draft()
        };
        assert!(validate_draft(&d, &resolver()).is_ok());
    }

    #[test]
    fn unparseable_date_rejected() {
        let d = SessionDraft {
            date: "01/06/2025".to_string(),
            ..draft()
        };
        assert_matches!(validate_draft(&d, &resolver()), Err(CoreError::Validation(_)));
    }
}
