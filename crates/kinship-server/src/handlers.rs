//! HTTP request handlers for the friend API.
//!
//! Every `/friend` route authenticates the bearer token, hands the verb to
//! the relationship engine, and renders the result envelope. Expected
//! failures are reported with `200` and `success: false`; only store
//! failures become `500`.

use crate::session::{SessionError, SessionManager, SessionResponse};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router as AxumRouter,
};
use kinship_domain::traits::UserDirectory;
use kinship_domain::{RelationshipId, UserId};
use kinship_engine::{
    ActionResult, EngineError, ErrorKind, Listing, Outcome, RelationshipEngine, RelationshipView,
};
use kinship_store::SqliteStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Relationship engine over the SQLite store
    pub engine: Arc<RelationshipEngine<SqliteStore>>,
    /// Session manager for JWT token operations
    pub session_manager: Arc<SessionManager>,
}

/// Session establishment request
#[derive(Debug, Deserialize)]
pub struct EstablishSessionRequest {
    /// Identity of a user known to the directory
    pub user_id: String,
}

/// Body of `POST /friend`
#[derive(Debug, Deserialize)]
pub struct AddFriendRequest {
    /// Identity of the user to befriend
    pub user_uid: String,
}

/// Body of `POST /friend/search`
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Contact address to look up
    pub email: String,
}

/// Body of the record-addressed `PATCH` routes
#[derive(Debug, Deserialize)]
pub struct RecordActionRequest {
    /// Identity of the other user in the record
    pub friend_uid: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// Active relationship count, absent when the store is unreachable
    pub active_relationships: Option<usize>,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Missing, expired, or invalid session token
    Unauthorized(SessionError),
    /// Malformed request body or identity
    BadRequest(String),
    /// Session requested for an unknown user
    UnknownUser(String),
    /// Internal server error
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::Unauthorized(e) => {
                (StatusCode::UNAUTHORIZED, ErrorKind::InvalidRequest, e.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorKind::InvalidRequest, msg),
            AppError::UnknownUser(msg) => (StatusCode::NOT_FOUND, ErrorKind::NotFound, msg),
            AppError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Store, msg)
            }
        };

        let body = Json(ActionResult::<()>::failure(kind, message));
        (status, body).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::JwtEncode(_) | SessionError::Clock(_) => {
                AppError::InternalError(e.to_string())
            }
            other => AppError::Unauthorized(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserId, AppError> {
    let authorization = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    state.session_manager.authenticate(authorization).map_err(|e| {
        warn!("rejected request: {}", e);
        AppError::from(e)
    })
}

fn parse_user(raw: &str, field: &str) -> Result<UserId, AppError> {
    UserId::from_string(raw.trim()).map_err(|e| AppError::BadRequest(format!("{}: {}", field, e)))
}

fn parse_record(raw: &str) -> Result<RelationshipId, AppError> {
    raw.parse::<i64>()
        .map(RelationshipId::new)
        .map_err(|_| AppError::BadRequest(format!("Invalid relationship id: {}", raw)))
}

fn failure(err: &EngineError) -> Response {
    let status = if err.is_expected() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ActionResult::<()>::from(err))).into_response()
}

fn outcome_response(result: Result<Outcome, EngineError>) -> Response {
    match result {
        Ok(outcome) => {
            let status = if outcome.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(ActionResult::<RelationshipView>::from(&outcome))).into_response()
        }
        Err(e) => failure(&e),
    }
}

fn listing_response(result: Result<Listing, EngineError>) -> Response {
    match result {
        Ok(listing) => {
            Json(ActionResult::<Vec<RelationshipView>>::from(&listing)).into_response()
        }
        Err(e) => failure(&e),
    }
}

/// POST /session/establish - Issue a session token for a known user
async fn establish_session(
    State(state): State<AppState>,
    body: Result<Json<EstablishSessionRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let Json(request) = body?;
    let user_id = parse_user(&request.user_id, "user_id")?;

    let known = state
        .engine
        .with_store(|store| store.find_by_identity(user_id))
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .map_err(|e| {
            error!("session lookup failed: {}", e);
            AppError::InternalError(e.to_string())
        })?;
    if known.is_none() {
        return Err(AppError::UnknownUser(format!("User not found: {}", user_id)));
    }

    debug!("issuing session for {}", user_id);
    Ok(Json(state.session_manager.establish(user_id)?))
}

/// POST /friend - Send or accept a friend request
async fn add_friend(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AddFriendRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let actor = authenticate(&state, &headers)?;
    let Json(request) = body?;
    let target = parse_user(&request.user_uid, "user_uid")?;

    Ok(outcome_response(state.engine.add(actor, target)))
}

/// POST /friend/search - Look up a user by contact address
async fn search_friend(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let actor = authenticate(&state, &headers)?;
    let Json(request) = body?;

    Ok(outcome_response(state.engine.search(actor, &request.email)))
}

/// GET /friend
async fn list_friends(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let actor = authenticate(&state, &headers)?;
    Ok(listing_response(state.engine.list_friends(actor)))
}

/// GET /friend/adviser
async fn list_advisers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let actor = authenticate(&state, &headers)?;
    Ok(listing_response(state.engine.list_advisers(actor)))
}

/// GET /friend/transmission
async fn list_sent_requests(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let actor = authenticate(&state, &headers)?;
    Ok(listing_response(state.engine.list_sent_requests(actor)))
}

/// GET /friend/reception
async fn list_received_requests(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let actor = authenticate(&state, &headers)?;
    Ok(listing_response(state.engine.list_received_requests(actor)))
}

/// GET /friend/block
async fn list_blocked(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let actor = authenticate(&state, &headers)?;
    Ok(listing_response(state.engine.list_blocked(actor)))
}

/// Shared extraction for the record-addressed routes
fn record_action(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    body: Result<Json<RecordActionRequest>, JsonRejection>,
) -> Result<(UserId, RelationshipId, UserId), AppError> {
    let actor = authenticate(state, headers)?;
    let record_id = parse_record(raw_id)?;
    let Json(request) = body?;
    let other = parse_user(&request.friend_uid, "friend_uid")?;
    Ok((actor, record_id, other))
}

/// PATCH /friend/rejection/:id
async fn reject_friend(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    body: Result<Json<RecordActionRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let (actor, record_id, other) = record_action(&state, &headers, &raw_id, body)?;
    Ok(outcome_response(state.engine.reject(actor, record_id, other)))
}

/// PATCH /friend/block/:id
async fn block_friend(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    body: Result<Json<RecordActionRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let (actor, record_id, other) = record_action(&state, &headers, &raw_id, body)?;
    Ok(outcome_response(state.engine.block(actor, record_id, other)))
}

/// PATCH /friend/unblock/:id
async fn unblock_friend(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    body: Result<Json<RecordActionRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let (actor, record_id, other) = record_action(&state, &headers, &raw_id, body)?;
    Ok(outcome_response(state.engine.unblock(actor, record_id, other)))
}

/// GET /health - Liveness and store reachability
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthCheckResponse>) {
    let count = state
        .engine
        .with_store(|store| store.ping().and_then(|_| store.count_active_relationships()));

    match count {
        Ok(Ok(active)) => (
            StatusCode::OK,
            Json(HealthCheckResponse {
                status: "healthy".to_string(),
                active_relationships: Some(active),
            }),
        ),
        Ok(Err(e)) => {
            error!("health check failed: {}", e);
            unhealthy()
        }
        Err(e) => {
            error!("health check failed: {}", e);
            unhealthy()
        }
    }
}

fn unhealthy() -> (StatusCode, Json<HealthCheckResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(HealthCheckResponse {
            status: "unhealthy".to_string(),
            active_relationships: None,
        }),
    )
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/session/establish", post(establish_session))
        .route("/friend", get(list_friends).post(add_friend))
        .route("/friend/search", post(search_friend))
        .route("/friend/adviser", get(list_advisers))
        .route("/friend/transmission", get(list_sent_requests))
        .route("/friend/reception", get(list_received_requests))
        .route("/friend/block", get(list_blocked))
        .route("/friend/rejection/:id", patch(reject_friend))
        .route("/friend/block/:id", patch(block_friend))
        .route("/friend/unblock/:id", patch(unblock_friend))
        .route("/health", get(health_check))
        .with_state(state)
}
