//! Web server adapter.
//!
//! A JSON API over axum. Every response uses the same envelope:
//! `{"success": bool, "data": ..., "error": "..."}`.

mod error;
mod handlers;

pub use error::{status_from_error, WebError};
pub use handlers::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::session::SessionManager;
use crate::domain::token::TokenCatalog;
use crate::ports::score_port::ScorePort;
use crate::ports::simulation_port::SimulationPort;

pub struct AppState {
    pub manager: Arc<SessionManager>,
    pub catalog: Arc<TokenCatalog>,
    pub feed: Arc<dyn SimulationPort + Send + Sync>,
    pub scores: Option<Arc<dyn ScorePort + Send + Sync>>,
    pub clock: fn() -> DateTime<Utc>,
}

impl AppState {
    pub fn new(
        manager: Arc<SessionManager>,
        catalog: Arc<TokenCatalog>,
        feed: Arc<dyn SimulationPort + Send + Sync>,
    ) -> Self {
        Self {
            manager,
            catalog,
            feed,
            scores: None,
            clock: Utc::now,
        }
    }

    pub fn with_scores(mut self, scores: Arc<dyn ScorePort + Send + Sync>) -> Self {
        self.scores = Some(scores);
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/tokens", get(handlers::list_tokens))
        .route("/api/tournament", get(handlers::tournament_info))
        .route("/api/validate-deck", post(handlers::validate_deck))
        .route("/api/lock-deck", post(handlers::lock_deck))
        .route("/api/sessions", get(handlers::list_sessions))
        .route("/api/session/{id}", get(handlers::get_session))
        .route("/api/session/{id}/results", get(handlers::session_results))
        .route("/api/simulate-session", post(handlers::simulate_session))
        .route("/api/leaderboard", get(handlers::get_leaderboard))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}
