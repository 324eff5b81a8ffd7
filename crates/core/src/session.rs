//! Session records as delivered by the REST API.
//!
//! Records are read-only snapshots. Field shapes vary between API versions
//! (explicit instants vs. legacy date + time-of-day, several capacity
//! aliases, participant lists vs. counts), so every field is optional and
//! deserialization is tolerant.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lenient;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub const STATUS_DRAFT: &str = "DRAFT";
pub const STATUS_OPEN: &str = "OPEN";
pub const STATUS_PUBLISHED: &str = "PUBLISHED";
pub const STATUS_LOCKED: &str = "LOCKED";
pub const STATUS_FINISHED: &str = "FINISHED";
pub const STATUS_CANCELED: &str = "CANCELED";
pub const STATUS_CANCELLED: &str = "CANCELLED";

/// Lifecycle status of a session.
///
/// `PUBLISHED` is accepted as an alias of `OPEN` and `CANCELLED` as an alias
/// of `CANCELED`. Unknown values are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionStatus {
    Draft,
    Open,
    Locked,
    Finished,
    Canceled,
    Other(String),
}

impl SessionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => STATUS_DRAFT,
            Self::Open => STATUS_OPEN,
            Self::Locked => STATUS_LOCKED,
            Self::Finished => STATUS_FINISHED,
            Self::Canceled => STATUS_CANCELED,
            Self::Other(raw) => raw,
        }
    }

    /// Statuses that can never accept new participants.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Finished | Self::Canceled | Self::Locked)
    }
}

impl From<String> for SessionStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            STATUS_DRAFT => Self::Draft,
            STATUS_OPEN | STATUS_PUBLISHED => Self::Open,
            STATUS_LOCKED => Self::Locked,
            STATUS_FINISHED => Self::Finished,
            STATUS_CANCELED | STATUS_CANCELLED => Self::Canceled,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for SessionStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<SessionStatus> for String {
    fn from(status: SessionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Who can see and join a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Visibility {
    Public,
    Private,
    Group,
    Other(String),
}

impl Visibility {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
            Self::Group => "GROUP",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Visibility {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PUBLIC" => Self::Public,
            "PRIVATE" => Self::Private,
            "GROUP" => Self::Group,
            _ => Self::Other(raw),
        }
    }
}

impl From<Visibility> for String {
    fn from(visibility: Visibility) -> Self {
        visibility.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Participants as sent by the API: the member list, or only a head count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Participants {
    List(Vec<Value>),
    Count(u64),
}

/// A scheduled sporting event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unreadable ids become `0`.
    #[serde(default, deserialize_with = "lenient::id_or_zero")]
    pub id: DbId,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_tag")]
    pub status: Option<SessionStatus>,
    #[serde(default, deserialize_with = "lenient::opt_tag")]
    pub visibility: Option<Visibility>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub group_id: Option<DbId>,

    // Explicit instants.
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub end: Option<String>,

    // Legacy calendar day + time-of-day.
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub end_time: Option<String>,

    // Capacity aliases, in priority order.
    #[serde(default, deserialize_with = "lenient::opt_count")]
    pub max_players: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    pub capacity: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    pub max_participants: Option<u64>,

    #[serde(default, deserialize_with = "lenient::opt_participants")]
    pub participants: Option<Participants>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    pub participants_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    pub participant_count: Option<u64>,
}

impl SessionRecord {
    /// Status, treating a missing value as an unknown empty status.
    pub fn status(&self) -> SessionStatus {
        self.status
            .clone()
            .unwrap_or_else(|| SessionStatus::Other(String::new()))
    }

    /// Maximum number of participants; `0` means no cap was given.
    pub fn capacity(&self) -> u64 {
        self.max_players
            .or(self.capacity)
            .or(self.max_participants)
            .unwrap_or(0)
    }

    /// Participant count from the list length, falling back to the explicit
    /// count fields.
    pub fn participant_count(&self) -> u64 {
        match &self.participants {
            Some(Participants::List(list)) => list.len() as u64,
            Some(Participants::Count(count)) => *count,
            None => self
                .participants_count
                .or(self.participant_count)
                .unwrap_or(0),
        }
    }

    /// A session is full when it has a positive capacity that is reached.
    pub fn is_full(&self) -> bool {
        let capacity = self.capacity();
        capacity > 0 && self.participant_count() >= capacity
    }

    /// Remaining seats, or `None` when the session has no cap.
    pub fn spots_left(&self) -> Option<u64> {
        match self.capacity() {
            0 => None,
            capacity => Some(capacity.saturating_sub(self.participant_count())),
        }
    }

    /// Whether `user_id` appears in the participant list.
    ///
    /// List entries may be bare ids or objects carrying `user_id`, `id`, or a
    /// nested `user`.
    pub fn has_participant(&self, user_id: DbId) -> bool {
        match &self.participants {
            Some(Participants::List(list)) => list
                .iter()
                .any(|entry| participant_id(entry) == Some(user_id)),
            _ => false,
        }
    }
}

fn participant_id(entry: &Value) -> Option<DbId> {
    match entry {
        Value::Object(map) => map
            .get("user_id")
            .and_then(lenient::as_id)
            .or_else(|| map.get("user").and_then(participant_id))
            .or_else(|| map.get("id").and_then(lenient::as_id)),
        other => lenient::as_id(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> SessionRecord {
        serde_json::from_value(value).unwrap()
    }

    // -----------------------------------------------------------------------
    // Status parsing
    // -----------------------------------------------------------------------

    #[test]
    fn status_aliases() {
        assert_eq!(SessionStatus::from("published"), SessionStatus::Open);
        assert_eq!(SessionStatus::from("Cancelled"), SessionStatus::Canceled);
        assert_eq!(SessionStatus::from("LOCKED"), SessionStatus::Locked);
    }

    #[test]
    fn unknown_status_is_preserved() {
        let status = SessionStatus::from("ARCHIVED");
        assert_eq!(status, SessionStatus::Other("ARCHIVED".to_string()));
        assert_eq!(status.to_string(), "ARCHIVED");
        assert!(!status.is_closed());
    }

    #[test]
    fn status_serializes_canonically() {
        let value = serde_json::to_value(SessionStatus::from("published")).unwrap();
        assert_eq!(value, json!("OPEN"));
    }

    // -----------------------------------------------------------------------
    // Capacity and participants
    // -----------------------------------------------------------------------

    #[test]
    fn capacity_prefers_max_players() {
        let s = record(json!({"id": 1, "max_players": 10, "capacity": 4}));
        assert_eq!(s.capacity(), 10);
    }

    #[test]
    fn capacity_falls_back_through_aliases() {
        assert_eq!(record(json!({"id": 1, "capacity": "6"})).capacity(), 6);
        assert_eq!(record(json!({"id": 1, "max_participants": 12})).capacity(), 12);
        assert_eq!(record(json!({"id": 1})).capacity(), 0);
    }

    #[test]
    fn participant_count_prefers_list() {
        let s = record(json!({"id": 1, "participants": [1, 2, 3], "participants_count": 9}));
        assert_eq!(s.participant_count(), 3);
    }

    #[test]
    fn participant_count_falls_back_to_counter() {
        let s = record(json!({"id": 1, "participant_count": 5}));
        assert_eq!(s.participant_count(), 5);
    }

    #[test]
    fn full_requires_positive_capacity() {
        assert!(!record(json!({"id": 1, "max_players": 0, "participants": []})).is_full());
        assert!(record(json!({"id": 1, "max_players": 2, "participants": [1, 2]})).is_full());
        assert!(!record(json!({"id": 1, "max_players": 3, "participants": [1, 2]})).is_full());
    }

    #[test]
    fn spots_left_without_cap_is_none() {
        assert_eq!(record(json!({"id": 1})).spots_left(), None);
        assert_eq!(
            record(json!({"id": 1, "max_players": 4, "participants": [1]})).spots_left(),
            Some(3)
        );
    }

    #[test]
    fn has_participant_reads_various_shapes() {
        let s = record(json!({
            "id": 1,
            "participants": [7, {"user_id": 8}, {"user": {"id": 9}}, {"id": "10"}]
        }));
        assert!(s.has_participant(7));
        assert!(s.has_participant(8));
        assert!(s.has_participant(9));
        assert!(s.has_participant(10));
        assert!(!s.has_participant(11));
    }

    #[test]
    fn participants_may_be_a_head_count() {
        let s = record(json!({"id": 1, "status": "OPEN", "max_players": 8, "participants": 8}));
        assert_eq!(s.participants, Some(Participants::Count(8)));
        assert_eq!(s.participant_count(), 8);
        assert!(s.is_full());
        assert!(!s.has_participant(1));

        let s = record(json!({"id": 1, "participants": "3"}));
        assert_eq!(s.participant_count(), 3);
    }

    #[test]
    fn unreadable_participants_fall_back_to_counters() {
        let s = record(json!({"id": 1, "participants": {"x": 1}, "participants_count": 4}));
        assert_eq!(s.participants, None);
        assert_eq!(s.participant_count(), 4);
    }

    #[test]
    fn id_may_be_numeric_string() {
        assert_eq!(record(json!({"id": "12"})).id, 12);
        assert_eq!(record(json!({"id": "abc"})).id, 0);
        assert_eq!(record(json!({})).id, 0);
    }

    #[test]
    fn non_string_status_is_kept_as_other() {
        let s = record(json!({"id": 1, "status": 3, "visibility": ["PUBLIC"]}));
        assert_eq!(s.status, Some(SessionStatus::Other("3".to_string())));
        assert_eq!(s.visibility, None);
        assert!(!s.status().is_closed());
    }

    #[test]
    fn tolerates_nulls_and_odd_types() {
        let s = record(json!({
            "id": 3,
            "title": null,
            "start": null,
            "max_players": "many",
            "visibility": "group",
            "group_id": "14"
        }));
        assert_eq!(s.title, None);
        assert_eq!(s.start, None);
        assert_eq!(s.capacity(), 0);
        assert_eq!(s.visibility, Some(Visibility::Group));
        assert_eq!(s.group_id, Some(14));
    }
}
