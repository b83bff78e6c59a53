//! Domain error types.

use crate::domain::deck::DeckValidation;
use serde::Serialize;

/// A single failed deck check. The validator reports every failing check
/// together, so a verdict may carry several of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationFailure {
    #[error("deck must contain exactly {expected} tokens, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("duplicate token(s): {}", .symbols.join(", "))]
    DuplicateToken { symbols: Vec<String> },

    #[error("unknown token(s): {}", .symbols.join(", "))]
    UnknownToken { symbols: Vec<String> },

    #[error("total weight {total_weight} exceeds limit {weight_limit} by {overage}")]
    WeightExceeded {
        total_weight: u64,
        weight_limit: u64,
        overage: u64,
    },
}

/// Top-level error type for tokenleague.
#[derive(Debug, thiserror::Error)]
pub enum LeagueError {
    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("storage query error: {reason}")]
    StorageQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("catalog error: {reason}")]
    Catalog { reason: String },

    #[error("simulation feed error for session {session_id}: {reason}")]
    SimulationFeed { session_id: String, reason: String },

    #[error("invalid simulation data: {reason}")]
    SimulationInvalid { reason: String },

    #[error("invalid deck: {0}")]
    InvalidDeck(Box<DeckValidation>),

    #[error("wallet {wallet_address} is not on the access list")]
    NotWhitelisted { wallet_address: String },

    #[error("session {session_id} expired at {expires_at}")]
    SessionExpired {
        session_id: String,
        expires_at: chrono::DateTime<chrono::Utc>,
    },

    #[error("session {session_id} already has a different simulation result")]
    AlreadySimulated { session_id: String },

    #[error("session {session_id} not found")]
    NotFound { session_id: String },

    #[error("simulation result belongs to session {found}, not {expected}")]
    SessionMismatch { expected: String, found: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LeagueError {
    /// True for failures the caller can recover from by adjusting input or
    /// starting a new session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LeagueError::InvalidDeck(_)
                | LeagueError::SessionExpired { .. }
                | LeagueError::AlreadySimulated { .. }
                | LeagueError::NotWhitelisted { .. }
        )
    }
}

impl From<&LeagueError> for std::process::ExitCode {
    fn from(err: &LeagueError) -> Self {
        let code: u8 = match err {
            LeagueError::Io(_) => 1,
            LeagueError::ConfigParse { .. }
            | LeagueError::ConfigMissing { .. }
            | LeagueError::ConfigInvalid { .. } => 2,
            LeagueError::Storage { .. } | LeagueError::StorageQuery { .. } => 3,
            LeagueError::InvalidDeck(_) | LeagueError::NotWhitelisted { .. } => 4,
            LeagueError::SessionExpired { .. }
            | LeagueError::AlreadySimulated { .. }
            | LeagueError::NotFound { .. }
            | LeagueError::SessionMismatch { .. } => 5,
            LeagueError::Catalog { .. }
            | LeagueError::SimulationFeed { .. }
            | LeagueError::SimulationInvalid { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
