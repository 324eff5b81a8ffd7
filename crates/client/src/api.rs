//! HTTP wrapper for the sessions and billing endpoints.
//!
//! Wraps the REST API (session listing, join/leave, quota snapshot) using
//! [`reqwest`]. Responses are decoded into `sportsync-core` records.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use sportsync_core::error::CoreError;
use sportsync_core::quota::{LimitMode, PlanFlags, QuotaAction, QuotaEvaluator, QuotaSnapshot};
use sportsync_core::session::SessionRecord;
use sportsync_core::types::DbId;

use crate::config::ClientConfig;

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The body was not the JSON shape we expected.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The action was refused locally before any request was sent.
    #[error(transparent)]
    Denied(#[from] CoreError),
}

/// Session listings come back either bare or paginated.
#[derive(Deserialize)]
#[serde(untagged)]
enum SessionList {
    Plain(Vec<SessionRecord>),
    Paginated { results: Vec<SessionRecord> },
}

impl From<SessionList> for Vec<SessionRecord> {
    fn from(list: SessionList) -> Self {
        match list {
            SessionList::Plain(sessions) => sessions,
            SessionList::Paginated { results } => results,
        }
    }
}

/// Fresh snapshots returned after joining a session.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub session: SessionRecord,
    pub quotas: QuotaSnapshot,
}

/// HTTP client for one REST API deployment.
pub struct SportsApi {
    client: reqwest::Client,
    config: ClientConfig,
    evaluator: QuotaEvaluator,
}

impl SportsApi {
    /// Create a client with the configured request timeout.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self {
            client,
            config,
            evaluator: QuotaEvaluator::default(),
        }
    }

    /// Use `mode` for the local quota pre-check on join.
    pub fn with_limit_mode(mut self, mode: LimitMode) -> Self {
        self.evaluator = QuotaEvaluator::new(mode);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// List sessions visible to the current user.
    ///
    /// Sends `GET /sessions/`. Accepts a bare array or a paginated
    /// `{results: [...]}` body.
    pub async fn list_sessions(&self) -> Result<Vec<SessionRecord>, ApiError> {
        let response = self.request(Method::GET, "/sessions/").send().await?;
        let list: SessionList = Self::parse_response(response).await?;
        let sessions: Vec<SessionRecord> = list.into();
        tracing::debug!(count = sessions.len(), "Fetched sessions");
        Ok(sessions)
    }

    /// Fetch one session. Sends `GET /sessions/{id}/`.
    pub async fn get_session(&self, session_id: DbId) -> Result<SessionRecord, ApiError> {
        let response = self
            .request(Method::GET, &format!("/sessions/{session_id}/"))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Fetch and normalize the current user's quota snapshot.
    ///
    /// Sends `GET /billing/quotas/`. Both the canonical and the legacy
    /// payload shapes are accepted.
    pub async fn get_quotas(&self) -> Result<QuotaSnapshot, ApiError> {
        let response = self.request(Method::GET, "/billing/quotas/").send().await?;
        let payload: serde_json::Value = Self::parse_response(response).await?;
        let quotas = QuotaSnapshot::from_payload(&payload);
        tracing::debug!(plan = %quotas.plan, "Fetched quota snapshot");
        Ok(quotas)
    }

    /// Join a session.
    ///
    /// Checks the join quota against a fresh snapshot first and refuses
    /// locally with [`ApiError::Denied`] when it is exhausted. On success,
    /// sends `POST /sessions/{id}/join/` and re-fetches both the session and
    /// the quota snapshot.
    pub async fn join_session(&self, session_id: DbId) -> Result<JoinOutcome, ApiError> {
        let quotas = self.get_quotas().await?;
        let flags = PlanFlags::from_quotas(&quotas);
        if let Err(e) = self.evaluator.check(QuotaAction::JoinSession, &quotas, &flags) {
            tracing::info!(session_id, error = %e, "Join refused by quota");
            return Err(e.into());
        }

        let response = self
            .request(Method::POST, &format!("/sessions/{session_id}/join/"))
            .send()
            .await?;
        Self::check_status(response).await?;
        tracing::info!(session_id, "Joined session");

        let session = self.get_session(session_id).await?;
        let quotas = self.get_quotas().await?;
        Ok(JoinOutcome { session, quotas })
    }

    /// Leave a session. Sends `POST /sessions/{id}/leave/` and returns the
    /// re-fetched quota snapshot.
    pub async fn leave_session(&self, session_id: DbId) -> Result<QuotaSnapshot, ApiError> {
        let response = self
            .request(Method::POST, &format!("/sessions/{session_id}/leave/"))
            .send()
            .await?;
        Self::check_status(response).await?;
        tracing::info!(session_id, "Left session");

        self.get_quotas().await
    }

    // ---- private helpers ----

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.config.api_url, path));
        match &self.config.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Api`] containing the
    /// status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(status = status.as_u16(), "API request failed");
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
