//! Best-score bookkeeping and the leaderboard.

use crate::domain::error::LeagueError;
use crate::domain::rules::normalize_wallet;
use crate::domain::session::Session;
use crate::ports::score_port::ScorePort;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;

pub const SCORE_KEY_PREFIX: &str = "score_";

pub fn score_key(wallet_address: &str) -> String {
    format!("{SCORE_KEY_PREFIX}{}", normalize_wallet(wallet_address))
}

/// Parse a stored score. Anything that is not a finite number is `None`.
pub fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// The stored best score for a wallet. An unparseable value is logged and
/// treated as absent.
pub fn best_score(store: &dyn ScorePort, wallet_address: &str) -> Result<Option<f64>, LeagueError> {
    let key = score_key(wallet_address);
    let Some(raw) = store.get(&key)? else {
        return Ok(None);
    };
    let parsed = parse_score(&raw);
    if parsed.is_none() {
        warn!("ignoring corrupt best score {raw:?} under {key}");
    }
    Ok(parsed)
}

/// Store `score` if it beats the wallet's best. Returns true when written.
pub fn record_best_score(
    store: &dyn ScorePort,
    wallet_address: &str,
    score: f64,
) -> Result<bool, LeagueError> {
    if !score.is_finite() {
        return Err(LeagueError::SimulationInvalid {
            reason: format!("cannot record non-finite score {score}"),
        });
    }
    let written = store.set_max(&score_key(wallet_address), score)?;
    if written {
        debug!("new best score {score:.2} for {}", normalize_wallet(wallet_address));
    }
    Ok(written)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub wallet_address: String,
    pub best_score: f64,
    pub session_id: String,
}

/// Rank wallets by their best simulated session. Ties go to the
/// lexicographically smaller wallet; within a wallet, the earlier session
/// keeps the spot.
pub fn leaderboard(sessions: &[Session]) -> Vec<LeaderboardEntry> {
    let mut best: HashMap<&str, &Session> = HashMap::new();
    for s in sessions {
        let Some(score) = s.final_score.filter(|_| s.simulation_completed) else {
            continue;
        };
        match best.get(s.wallet_address.as_str()) {
            Some(current) if current.final_score.unwrap_or(f64::MIN) >= score => {}
            _ => {
                best.insert(s.wallet_address.as_str(), s);
            }
        }
    }

    let mut entries: Vec<LeaderboardEntry> = best
        .into_values()
        .map(|s| LeaderboardEntry {
            rank: 0,
            wallet_address: s.wallet_address.clone(),
            best_score: s.final_score.unwrap_or_default(),
            session_id: s.session_id.clone(),
        })
        .collect();

    entries.sort_by(|a, b| {
        b.best_score
            .total_cmp(&a.best_score)
            .then_with(|| a.wallet_address.cmp(&b.wallet_address))
    });
    for (i, e) in entries.iter_mut().enumerate() {
        e.rank = i as u32 + 1;
    }
    entries
}
