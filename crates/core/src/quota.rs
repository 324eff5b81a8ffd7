//! Plan quotas: payload normalization and gating decisions.
//!
//! The billing API has shipped two payload shapes:
//!
//! - canonical: `{plan, plan_expires_at?, limits: {...}, usage: {...}}`
//! - legacy: `{plan, quotas: {max_sessions, max_participations, max_groups}}`
//!
//! [`QuotaSnapshot::from_payload`] folds both into the canonical shape. A
//! snapshot is never decremented locally; callers re-fetch after any
//! quota-consuming action.

use std::fmt;
use std::str::FromStr;

use chrono::{Offset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::lenient;
use crate::timing::parse_instant;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Limit and counter names
// ---------------------------------------------------------------------------

pub const LIMIT_SESSIONS_CREATE: &str = "sessions_create_per_month";
pub const LIMIT_SESSIONS_JOIN: &str = "sessions_join_per_month";
pub const LIMIT_TRAININGS_CREATE: &str = "trainings_create_per_month";
pub const LIMIT_GROUPS_JOINED: &str = "max_groups_joined";
pub const LIMIT_GROUPS_CREATED: &str = "max_groups_created";

pub const FLAG_CAN_CREATE_TRAININGS: &str = "can_create_trainings";
pub const FLAG_CAN_CREATE_GROUPS: &str = "can_create_groups";

pub const USAGE_SESSIONS_CREATED: &str = "sessions_created";
pub const USAGE_SESSIONS_JOINED: &str = "sessions_joined";
pub const USAGE_TRAININGS_CREATED: &str = "trainings_created";
pub const USAGE_GROUPS_JOINED: &str = "groups_joined";
pub const USAGE_GROUPS_CREATED: &str = "groups_created";

/// Legacy `quotas` key → (canonical limit, usage counter).
const LEGACY_LIMIT_KEYS: &[(&str, &str, &str)] = &[
    ("max_sessions", LIMIT_SESSIONS_CREATE, USAGE_SESSIONS_CREATED),
    ("max_participations", LIMIT_SESSIONS_JOIN, USAGE_SESSIONS_JOINED),
    ("max_groups", LIMIT_GROUPS_JOINED, USAGE_GROUPS_JOINED),
];

/// String values meaning "no ceiling" (compared case-insensitively).
const UNLIMITED_SENTINELS: &[&str] = &["unlimited", "infinity", "inf", "∞"];

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Subscription tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Plan {
    #[default]
    Free,
    Premium,
    Coach,
    Other(String),
}

impl Plan {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
            Self::Coach => "coach",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, Self::Free)
    }
}

impl From<String> for Plan {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "free" => Self::Free,
            "premium" => Self::Premium,
            "coach" => Self::Coach,
            _ => Self::Other(raw),
        }
    }
}

impl From<Plan> for String {
    fn from(plan: Plan) -> Self {
        plan.as_str().to_string()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A quota-gated user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaAction {
    CreateSession,
    CreateTraining,
    JoinSession,
    CreateGroup,
    JoinGroup,
}

impl QuotaAction {
    pub const ALL: [QuotaAction; 5] = [
        Self::CreateSession,
        Self::CreateTraining,
        Self::JoinSession,
        Self::CreateGroup,
        Self::JoinGroup,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateSession => "create_session",
            Self::CreateTraining => "create_training",
            Self::JoinSession => "join_session",
            Self::CreateGroup => "create_group",
            Self::JoinGroup => "join_group",
        }
    }

    /// Limit key in the canonical `limits` map.
    pub fn limit_key(self) -> &'static str {
        match self {
            Self::CreateSession => LIMIT_SESSIONS_CREATE,
            Self::CreateTraining => LIMIT_TRAININGS_CREATE,
            Self::JoinSession => LIMIT_SESSIONS_JOIN,
            Self::CreateGroup => LIMIT_GROUPS_CREATED,
            Self::JoinGroup => LIMIT_GROUPS_JOINED,
        }
    }

    /// Counter key in the canonical `usage` map.
    pub fn usage_key(self) -> &'static str {
        match self {
            Self::CreateSession => USAGE_SESSIONS_CREATED,
            Self::CreateTraining => USAGE_TRAININGS_CREATED,
            Self::JoinSession => USAGE_SESSIONS_JOINED,
            Self::CreateGroup => USAGE_GROUPS_CREATED,
            Self::JoinGroup => USAGE_GROUPS_JOINED,
        }
    }

    /// Plan-level boolean flag that can veto the action outright.
    pub fn plan_flag(self) -> Option<&'static str> {
        match self {
            Self::CreateTraining => Some(FLAG_CAN_CREATE_TRAININGS),
            Self::CreateGroup => Some(FLAG_CAN_CREATE_GROUPS),
            _ => None,
        }
    }
}

impl fmt::Display for QuotaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// How to treat limit values that are neither numeric nor a known sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitMode {
    /// Unrecognized limits allow the action.
    #[default]
    Lenient,
    /// Unrecognized limits deny the action.
    Strict,
}

impl FromStr for LimitMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(CoreError::Validation(format!(
                "Invalid limit mode '{other}'. Must be one of: lenient, strict"
            ))),
        }
    }
}

/// Interpreted value of one limit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Unlimited,
    Ceiling(u64),
    Unrecognized,
}

impl Limit {
    /// Interpret a raw limit value. Missing keys, `null`, negative numbers and
    /// the string sentinels mean unlimited. Fractional ceilings round up.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Unlimited,
            Some(Value::Number(n)) => match (n.as_u64(), n.as_f64()) {
                (Some(limit), _) => Self::Ceiling(limit),
                (None, Some(f)) => Self::from_number(f),
                (None, None) => Self::Unrecognized,
            },
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if UNLIMITED_SENTINELS
                    .iter()
                    .any(|sentinel| trimmed.eq_ignore_ascii_case(sentinel))
                {
                    return Self::Unlimited;
                }
                trimmed
                    .parse::<f64>()
                    .map_or(Self::Unrecognized, Self::from_number)
            }
            Some(_) => Self::Unrecognized,
        }
    }

    fn from_number(f: f64) -> Self {
        if f < 0.0 {
            Self::Unlimited
        } else if f.is_finite() {
            Self::Ceiling(f.ceil() as u64)
        } else {
            Self::Unrecognized
        }
    }

    /// Whether one more action is allowed after `used` so far.
    pub fn allows(self, used: u64, mode: LimitMode) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Ceiling(limit) => used < limit,
            Self::Unrecognized => mode == LimitMode::Lenient,
        }
    }

    /// Numeric ceiling, if any.
    pub fn ceiling(self) -> Option<u64> {
        match self {
            Self::Ceiling(limit) => Some(limit),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Canonical quota record for the current user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    #[serde(default)]
    pub plan: Plan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_expires_at: Option<Timestamp>,
    #[serde(default)]
    pub limits: Map<String, Value>,
    #[serde(default)]
    pub usage: Map<String, Value>,
}

impl QuotaSnapshot {
    /// Normalize a billing payload of either shape.
    ///
    /// Never fails: a payload that is not an object yields a default free
    /// plan with no limits.
    pub fn from_payload(payload: &Value) -> Self {
        let Some(object) = payload.as_object() else {
            tracing::debug!("Quota payload is not an object, using empty snapshot");
            return Self::default();
        };

        let plan = object
            .get("plan")
            .and_then(Value::as_str)
            .map(|raw| Plan::from(raw.to_string()))
            .unwrap_or_default();
        let plan_expires_at = object
            .get("plan_expires_at")
            .and_then(Value::as_str)
            .and_then(|raw| parse_instant(raw, &Utc.fix()));
        let payload_usage = object
            .get("usage")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let legacy = object.get("quotas").and_then(Value::as_object);
        let (limits, usage) = match (object.get("limits").and_then(Value::as_object), legacy) {
            (Some(limits), _) => (limits.clone(), payload_usage),
            (None, Some(quotas)) => normalize_legacy(quotas, &payload_usage),
            (None, None) => (Map::new(), payload_usage),
        };

        Self {
            plan,
            plan_expires_at,
            limits,
            usage,
        }
    }

    /// Interpreted limit for `action`.
    ///
    /// Training creation falls back to the session-creation limit when the
    /// payload has no training-specific entry.
    pub fn limit(&self, action: QuotaAction) -> Limit {
        Limit::from_value(self.limits.get(self.effective_limit_key(action)))
    }

    /// Current usage counter for `action`; missing or non-numeric is `0`.
    pub fn used(&self, action: QuotaAction) -> u64 {
        let key = if self.uses_session_fallback(action) {
            USAGE_SESSIONS_CREATED
        } else {
            action.usage_key()
        };
        self.usage.get(key).and_then(lenient::as_count).unwrap_or(0)
    }

    /// Boolean plan flag stored alongside the limits, if present.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.limits.get(key).and_then(Value::as_bool)
    }

    /// Whether the plan is still within its paid period at `now`.
    pub fn plan_is_active(&self, now: Timestamp) -> bool {
        self.plan_expires_at.map_or(true, |expires| now < expires)
    }

    fn effective_limit_key(&self, action: QuotaAction) -> &'static str {
        if self.uses_session_fallback(action) {
            LIMIT_SESSIONS_CREATE
        } else {
            action.limit_key()
        }
    }

    fn uses_session_fallback(&self, action: QuotaAction) -> bool {
        action == QuotaAction::CreateTraining && !self.limits.contains_key(LIMIT_TRAININGS_CREATE)
    }
}

fn normalize_legacy(
    quotas: &Map<String, Value>,
    payload_usage: &Map<String, Value>,
) -> (Map<String, Value>, Map<String, Value>) {
    let mut limits = Map::new();
    let mut usage = Map::new();

    for (key, value) in quotas {
        match LEGACY_LIMIT_KEYS.iter().find(|(legacy, _, _)| legacy == key) {
            Some((_, limit_key, usage_key)) => {
                limits.insert(limit_key.to_string(), value.clone());
                let used = payload_usage
                    .get(*usage_key)
                    .and_then(lenient::as_count)
                    .unwrap_or(0);
                usage.insert(usage_key.to_string(), Value::from(used));
            }
            None => {
                limits.insert(key.clone(), value.clone());
            }
        }
    }

    (limits, usage)
}

// ---------------------------------------------------------------------------
// Plan flags
// ---------------------------------------------------------------------------

/// Plan-level feature switches. `None` means "not stated", which never
/// denies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFlags {
    pub can_create_trainings: Option<bool>,
    pub can_create_groups: Option<bool>,
}

impl PlanFlags {
    /// Read the flags stored in a snapshot's `limits` map.
    pub fn from_quotas(quotas: &QuotaSnapshot) -> Self {
        Self {
            can_create_trainings: quotas.flag(FLAG_CAN_CREATE_TRAININGS),
            can_create_groups: quotas.flag(FLAG_CAN_CREATE_GROUPS),
        }
    }

    pub fn flag_for(&self, action: QuotaAction) -> Option<bool> {
        match action {
            QuotaAction::CreateTraining => self.can_create_trainings,
            QuotaAction::CreateGroup => self.can_create_groups,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// `used/limit` pair for display. `limit` is `None` when unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageLabel {
    pub used: u64,
    pub limit: Option<u64>,
}

impl fmt::Display for UsageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit {
            Some(limit) => write!(f, "{}/{}", self.used, limit),
            None => write!(f, "{}/∞", self.used),
        }
    }
}

/// Quota decisions under a given [`LimitMode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaEvaluator {
    pub mode: LimitMode,
}

impl QuotaEvaluator {
    pub fn new(mode: LimitMode) -> Self {
        Self { mode }
    }

    /// Decide `action`, explaining a denial.
    ///
    /// An explicit `false` plan flag denies regardless of usage. Otherwise an
    /// unlimited limit allows, and a numeric limit allows iff `used < limit`.
    pub fn check(
        &self,
        action: QuotaAction,
        quotas: &QuotaSnapshot,
        flags: &PlanFlags,
    ) -> Result<(), CoreError> {
        if flags.flag_for(action) == Some(false) {
            return Err(CoreError::Forbidden(format!(
                "The {} plan does not include {action}",
                quotas.plan
            )));
        }

        let limit = quotas.limit(action);
        let used = quotas.used(action);
        if limit.allows(used, self.mode) {
            return Ok(());
        }

        match limit {
            Limit::Ceiling(limit) => Err(CoreError::QuotaExceeded {
                action,
                used,
                limit,
            }),
            _ => Err(CoreError::Forbidden(format!(
                "Unrecognized limit value for {action}"
            ))),
        }
    }

    pub fn can_perform(&self, action: QuotaAction, quotas: &QuotaSnapshot, flags: &PlanFlags) -> bool {
        self.check(action, quotas, flags).is_ok()
    }

    /// Actions left before the limit is reached; `None` when unlimited.
    pub fn remaining(&self, action: QuotaAction, quotas: &QuotaSnapshot) -> Option<u64> {
        match quotas.limit(action) {
            Limit::Unlimited => None,
            Limit::Ceiling(limit) => Some(limit.saturating_sub(quotas.used(action))),
            Limit::Unrecognized => match self.mode {
                LimitMode::Lenient => {
                    tracing::debug!(%action, "Unrecognized limit treated as unlimited");
                    None
                }
                LimitMode::Strict => Some(0),
            },
        }
    }
}

/// Lenient [`QuotaEvaluator::can_perform`].
pub fn can_perform(action: QuotaAction, quotas: &QuotaSnapshot, flags: &PlanFlags) -> bool {
    QuotaEvaluator::default().can_perform(action, quotas, flags)
}

/// Usage and ceiling for `action`, for display.
pub fn usage_label(action: QuotaAction, quotas: &QuotaSnapshot) -> UsageLabel {
    UsageLabel {
        used: quotas.used(action),
        limit: quotas.limit(action).ceiling(),
    }
}
