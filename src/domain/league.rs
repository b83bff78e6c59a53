//! The simulate use case: feed, aggregate, attach, record.

use crate::domain::error::LeagueError;
use crate::domain::leaderboard;
use crate::domain::performance::SimulationResult;
use crate::domain::scoring::{self, Contribution, TokenTrend};
use crate::domain::session::{Session, SessionManager, SessionStatus};
use crate::ports::score_port::ScorePort;
use crate::ports::simulation_port::SimulationPort;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub session: Session,
    pub result: SimulationResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayLabel {
    pub day: u32,
    pub label: &'static str,
}

/// A stored result with the views derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsReport {
    pub session_id: String,
    pub wallet_address: String,
    pub status: SessionStatus,
    pub simulation_completed: bool,
    pub result: SimulationResult,
    pub contribution_breakdown: Vec<Contribution>,
    pub day_labels: Vec<DayLabel>,
    pub final_day_trends: Vec<TokenTrend>,
}

impl ResultsReport {
    pub fn build(session: &Session, result: SimulationResult) -> Self {
        let contribution_breakdown = scoring::breakdown_for(&result, session);
        let day_labels = result
            .daily_scores
            .iter()
            .map(|d| DayLabel {
                day: d.day,
                label: scoring::day_label(d.day, result.simulation_date),
            })
            .collect();
        let final_day_trends = result
            .final_day()
            .and_then(|d| scoring::day_over_day(&result, d.day))
            .unwrap_or_default();
        Self {
            session_id: session.session_id.clone(),
            wallet_address: session.wallet_address.clone(),
            status: session.status,
            simulation_completed: session.simulation_completed,
            result,
            contribution_breakdown,
            day_labels,
            final_day_trends,
        }
    }
}

/// Run the simulation for one session and persist the result.
///
/// A session that already carries a result is returned as-is without
/// consulting the engine again. If another run attaches first while this
/// one is fetching, its stored result is returned instead. When `scores` is
/// given, the wallet's best score is recorded on every successful return,
/// replays included.
pub fn run_simulation(
    manager: &SessionManager,
    feed: &dyn SimulationPort,
    scores: Option<&dyn ScorePort>,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<SimulationOutcome, LeagueError> {
    let session = manager.get(session_id, now)?;
    match session.status {
        SessionStatus::Expired => {
            return Err(LeagueError::SessionExpired {
                session_id: session.session_id,
                expires_at: session.expires_at,
            });
        }
        SessionStatus::Simulated => {
            if let Some(result) = session.simulation_results.clone() {
                info!("session {session_id} already simulated, returning stored result");
                let outcome = SimulationOutcome { session, result };
                record_best(scores, &outcome)?;
                return Ok(outcome);
            }
        }
        SessionStatus::Locked => {}
    }

    let days = feed.daily_performance(&session)?;
    let peers = manager.peer_scores(session_id)?;
    let result = scoring::aggregate(&session, &days, &peers, now)?;

    let outcome = match manager.attach_simulation(session_id, &result, now) {
        Ok(session) => SimulationOutcome { session, result },
        Err(LeagueError::AlreadySimulated { .. }) => stored_outcome(manager, session_id, now)?,
        Err(e) => return Err(e),
    };

    record_best(scores, &outcome)?;
    Ok(outcome)
}

/// The outcome attached by a concurrent run.
fn stored_outcome(
    manager: &SessionManager,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<SimulationOutcome, LeagueError> {
    let session = manager.get(session_id, now)?;
    match session.simulation_results.clone() {
        Some(result) => {
            info!("session {session_id} was simulated concurrently, returning stored result");
            Ok(SimulationOutcome { session, result })
        }
        None => Err(LeagueError::AlreadySimulated {
            session_id: session_id.to_string(),
        }),
    }
}

fn record_best(scores: Option<&dyn ScorePort>, outcome: &SimulationOutcome) -> Result<(), LeagueError> {
    let Some(store) = scores else {
        return Ok(());
    };
    let wallet = &outcome.session.wallet_address;
    match leaderboard::record_best_score(store, wallet, outcome.result.final_score) {
        Ok(_) => Ok(()),
        Err(e) => {
            warn!("failed to record best score for {wallet}: {e}");
            Err(e)
        }
    }
}
