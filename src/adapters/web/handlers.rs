//! HTTP request handlers for the web adapter.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::deck::DeckValidation;
use crate::domain::leaderboard::{self, LeaderboardEntry};
use crate::domain::league::{run_simulation, ResultsReport};
use crate::domain::session::Session;
use crate::domain::token::{Token, WeightTier};
use crate::ports::score_port::ScorePort;

use super::{ApiResponse, AppState, WebError};

type ApiResult<T> = Result<ApiResponse<T>, WebError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, WebError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| WebError::bad_request(e.body_text()))
}

#[derive(Debug, Serialize)]
pub struct TokenView {
    #[serde(flatten)]
    pub token: Token,
    pub tier: Option<WeightTier>,
}

#[derive(Debug, Serialize)]
pub struct TokenList {
    pub tokens: Vec<TokenView>,
    pub total_count: usize,
}

pub async fn list_tokens(State(state): State<Arc<AppState>>) -> ApiResult<TokenList> {
    let tokens: Vec<TokenView> = state
        .catalog
        .by_weight_desc()
        .into_iter()
        .map(|t| TokenView {
            tier: t.tier(),
            token: t.clone(),
        })
        .collect();
    Ok(ApiResponse::ok(TokenList {
        total_count: tokens.len(),
        tokens,
    }))
}

#[derive(Debug, Serialize)]
pub struct TournamentInfo {
    pub deck_size: usize,
    pub weight_limit: u32,
    pub duration_days: u32,
    pub session_ttl_hours: i64,
    pub whitelist_enabled: bool,
    pub token_count: usize,
}

pub async fn tournament_info(State(state): State<Arc<AppState>>) -> ApiResult<TournamentInfo> {
    let policy = state.manager.policy();
    Ok(ApiResponse::ok(TournamentInfo {
        deck_size: policy.rules.deck_size,
        weight_limit: policy.rules.weight_limit,
        duration_days: policy.rules.duration_days,
        session_ttl_hours: policy.session_ttl.num_hours(),
        whitelist_enabled: !policy.access.is_open(),
        token_count: state.catalog.len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ValidateDeckRequest {
    #[serde(alias = "selected_tokens")]
    pub tokens: Vec<String>,
}

/// Always 200: an invalid deck is a successful validation with
/// `is_valid: false`.
pub async fn validate_deck(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ValidateDeckRequest>, JsonRejection>,
) -> ApiResult<DeckValidation> {
    let req = body(payload)?;
    Ok(ApiResponse::ok(state.manager.validate(&req.tokens, &state.catalog)))
}

#[derive(Debug, Deserialize)]
pub struct LockDeckRequest {
    pub wallet_address: String,
    #[serde(alias = "tokens")]
    pub selected_tokens: Vec<String>,
}

pub async fn lock_deck(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LockDeckRequest>, JsonRejection>,
) -> ApiResult<Session> {
    let req = body(payload)?;
    if req.wallet_address.trim().is_empty() {
        return Err(WebError::bad_request("wallet_address is required"));
    }
    let session = state
        .manager
        .lock(&req.wallet_address, &req.selected_tokens, &state.catalog, state.now())?;
    Ok(ApiResponse::ok(session))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Session> {
    Ok(ApiResponse::ok(state.manager.get(&id, state.now())?))
}

pub async fn list_sessions(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Session>> {
    Ok(ApiResponse::ok(state.manager.list(state.now())?))
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub session_id: String,
}

pub async fn simulate_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SimulateRequest>, JsonRejection>,
) -> ApiResult<ResultsReport> {
    let req = body(payload)?;
    let scores = state.scores.as_deref().map(|s| s as &dyn ScorePort);
    let outcome = run_simulation(
        &state.manager,
        state.feed.as_ref(),
        scores,
        &req.session_id,
        state.now(),
    )?;
    Ok(ApiResponse::ok(ResultsReport::build(
        &outcome.session,
        outcome.result,
    )))
}

pub async fn session_results(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ResultsReport> {
    let session = state.manager.get(&id, state.now())?;
    let result = session
        .simulation_results
        .clone()
        .ok_or_else(|| WebError::not_found(format!("session {id} has no simulation results")))?;
    Ok(ApiResponse::ok(ResultsReport::build(&session, result)))
}

pub async fn get_leaderboard(State(state): State<Arc<AppState>>) -> ApiResult<Vec<LeaderboardEntry>> {
    let sessions = state.manager.list(state.now())?;
    Ok(ApiResponse::ok(leaderboard::leaderboard(&sessions)))
}

pub async fn not_found() -> WebError {
    WebError::not_found("no such endpoint")
}
