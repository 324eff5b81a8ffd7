use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use sportsync_client::{ClientConfig, SportsApi};

/// In-memory stand-in for the REST API.
///
/// Session 7 is the only joinable session; its participant list grows with
/// every join. Quotas report `sessions_joined` from the same counter so
/// tests can observe the re-fetch after a join. With `bare_list` the
/// listing is a plain array in the older, looser record shape.
#[derive(Clone, Default)]
pub struct MockApi {
    pub joined: Arc<AtomicU64>,
    pub join_limit: Option<u64>,
    pub legacy_quotas: bool,
    pub bare_list: bool,
    pub last_auth: Arc<Mutex<Option<String>>>,
}

impl MockApi {
    pub fn with_join_limit(limit: u64) -> Self {
        Self {
            join_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn joined(&self) -> u64 {
        self.joined.load(Ordering::SeqCst)
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/sessions/", get(list_sessions))
            .route("/sessions/{id}/", get(get_session))
            .route("/sessions/{id}/join/", post(join_session))
            .route("/sessions/{id}/leave/", post(leave_session))
            .route("/billing/quotas/", get(get_quotas))
            .with_state(self)
    }
}

fn session_json(id: i64, joined: u64) -> Value {
    let participants: Vec<Value> = (0..joined).map(|i| json!({"user_id": 100 + i})).collect();
    json!({
        "id": id,
        "title": format!("Session {id}"),
        "date": "2030-06-01",
        "start_time": "10:00",
        "status": "OPEN",
        "max_players": 10,
        "participants": participants
    })
}

async fn list_sessions(State(api): State<MockApi>, headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *api.last_auth.lock().unwrap() = auth;

    if api.bare_list {
        return Json(json!([
            session_json(7, api.joined()),
            {"id": "9", "start": "2030-07-01T18:00:00Z", "status": "OPEN", "max_players": 8, "participants": 8},
            {"id": 10, "status": 3, "participants": null}
        ]));
    }

    Json(json!({
        "count": 2,
        "results": [
            session_json(7, api.joined()),
            {"id": 8, "start": "2020-01-01T10:00:00Z", "status": "FINISHED"}
        ]
    }))
}

async fn get_session(State(api): State<MockApi>, Path(id): Path<i64>) -> Response {
    if id != 7 {
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    }
    Json(session_json(id, api.joined())).into_response()
}

async fn join_session(State(api): State<MockApi>, Path(id): Path<i64>) -> Response {
    if id != 7 {
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    }
    api.joined.fetch_add(1, Ordering::SeqCst);
    (StatusCode::CREATED, Json(json!({}))).into_response()
}

async fn leave_session(State(api): State<MockApi>, Path(_id): Path<i64>) -> StatusCode {
    let _ = api
        .joined
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    StatusCode::NO_CONTENT
}

async fn get_quotas(State(api): State<MockApi>) -> Json<Value> {
    let limit = api.join_limit.map_or(Value::Null, Value::from);
    if api.legacy_quotas {
        return Json(json!({
            "plan": "free",
            "quotas": {"max_participations": limit},
            "usage": {"sessions_joined": api.joined()}
        }));
    }
    Json(json!({
        "plan": "free",
        "limits": {"sessions_join_per_month": limit},
        "usage": {"sessions_joined": api.joined()}
    }))
}

/// Serve `router` on an ephemeral port and return its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Build a client pointed at `base_url` with a short timeout.
pub fn client(base_url: String, token: Option<&str>) -> SportsApi {
    SportsApi::new(ClientConfig::new(base_url, token.map(str::to_string), 5)).unwrap()
}
