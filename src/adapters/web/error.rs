//! HTTP error responses for the web adapter.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::domain::error::LeagueError;

use super::ApiResponse;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
    /// Extra detail returned alongside the error, e.g. a failed deck verdict.
    pub data: Option<Value>,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &LeagueError) -> StatusCode {
    match err {
        LeagueError::InvalidDeck(_)
        | LeagueError::ConfigParse { .. }
        | LeagueError::ConfigMissing { .. }
        | LeagueError::ConfigInvalid { .. }
        | LeagueError::SessionMismatch { .. } => StatusCode::BAD_REQUEST,
        LeagueError::NotWhitelisted { .. } => StatusCode::FORBIDDEN,
        LeagueError::NotFound { .. } => StatusCode::NOT_FOUND,
        LeagueError::AlreadySimulated { .. } => StatusCode::CONFLICT,
        LeagueError::SessionExpired { .. } => StatusCode::GONE,
        LeagueError::SimulationInvalid { .. } | LeagueError::SimulationFeed { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LeagueError::Catalog { .. }
        | LeagueError::Storage { .. }
        | LeagueError::StorageQuery { .. }
        | LeagueError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<LeagueError> for WebError {
    fn from(err: LeagueError) -> Self {
        let status = status_from_error(&err);
        if status.is_server_error() {
            log::error!("request failed: {err}");
        }
        let data = match &err {
            LeagueError::InvalidDeck(verdict) => serde_json::to_value(verdict.as_ref()).ok(),
            _ => None,
        };
        Self {
            status,
            message: err.to_string(),
            data,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = ApiResponse {
            success: false,
            data: self.data,
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}
