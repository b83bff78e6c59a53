//! Score aggregation: daily roll-ups, market position, contribution breakdown
//! and day-over-day comparison.

use crate::domain::error::LeagueError;
use crate::domain::performance::{DailyScore, DayPerformance, SimulationResult, TokenPerformance};
use crate::domain::session::Session;
use crate::domain::token::LockedToken;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Scores of other sessions keyed by day number.
pub type PeerScores = HashMap<u32, Vec<f64>>;

/// Roll the engine's per-day records up into a [`SimulationResult`].
///
/// Each day's score is the sum of its tokens' `final_score`. The records are
/// period-to-date, so the final score is simply the last day's score. When
/// `peers` has scores for a day the market position is ranked against them,
/// otherwise the engine's pre-computed position is passed through (or 1 if
/// the engine supplied none).
pub fn aggregate(
    session: &Session,
    days: &[DayPerformance],
    peers: &PeerScores,
    simulation_date: DateTime<Utc>,
) -> Result<SimulationResult, LeagueError> {
    check_days(days)?;

    let daily_scores: Vec<DailyScore> = days
        .iter()
        .map(|d| {
            let score = day_score(&d.tokens_performance);
            let market_position = match peers.get(&d.day) {
                Some(scores) if !scores.is_empty() => market_position(score, scores),
                _ => d.market_position.unwrap_or(1),
            };
            DailyScore {
                day: d.day,
                score,
                market_position,
                tokens_performance: d.tokens_performance.clone(),
            }
        })
        .collect();

    let last = daily_scores
        .last()
        .ok_or_else(|| LeagueError::SimulationInvalid {
            reason: "no simulated days".to_string(),
        })?;
    let final_score = last.score;
    let final_market_position = last.market_position;

    Ok(SimulationResult {
        session_id: session.session_id.clone(),
        wallet_address: session.wallet_address.clone(),
        simulation_date,
        daily_scores,
        final_score,
        final_market_position,
    })
}

pub fn day_score(tokens: &[TokenPerformance]) -> f64 {
    tokens.iter().map(|p| p.final_score).sum()
}

/// 1 + the number of peers with a strictly higher score.
pub fn market_position(score: f64, peer_scores: &[f64]) -> u32 {
    1 + peer_scores.iter().filter(|&&p| p > score).count() as u32
}

fn check_days(days: &[DayPerformance]) -> Result<(), LeagueError> {
    if days.is_empty() {
        return Err(LeagueError::SimulationInvalid {
            reason: "no simulated days".to_string(),
        });
    }
    for (i, d) in days.iter().enumerate() {
        let expected = i as u32 + 1;
        if d.day != expected {
            return Err(LeagueError::SimulationInvalid {
                reason: format!("expected day {expected}, got day {}", d.day),
            });
        }
        if d.market_position == Some(0) {
            return Err(LeagueError::SimulationInvalid {
                reason: format!("day {} has market_position 0", d.day),
            });
        }
        if let Some(p) = d.tokens_performance.iter().find(|p| !p.is_finite()) {
            return Err(LeagueError::SimulationInvalid {
                reason: format!("day {} has a non-finite value for {}", d.day, p.symbol),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub symbol: String,
    pub name: String,
    pub contribution: f64,
    pub percentage: f64,
    pub weight: u32,
}

/// Attribute the final day's score across the locked tokens.
///
/// Only tokens present in `locked_tokens` count. Percentages are 0 when the
/// total contribution is not positive. Sorted by contribution descending,
/// then symbol ascending.
pub fn contribution_breakdown(
    final_day: &DailyScore,
    locked_tokens: &[LockedToken],
) -> Vec<Contribution> {
    let weights: HashMap<String, u32> = locked_tokens
        .iter()
        .map(|t| (t.symbol.to_uppercase(), t.tournament_weight))
        .collect();

    let mut seen = HashSet::new();
    let mut entries: Vec<Contribution> = final_day
        .tokens_performance
        .iter()
        .filter_map(|p| {
            let symbol = p.symbol.to_uppercase();
            let weight = *weights.get(&symbol)?;
            if !seen.insert(symbol.clone()) {
                return None;
            }
            Some(Contribution {
                symbol,
                name: p.name.clone(),
                contribution: p.final_score,
                percentage: 0.0,
                weight,
            })
        })
        .collect();

    let total: f64 = entries.iter().map(|c| c.contribution).sum();
    if total > 0.0 {
        for entry in &mut entries {
            entry.percentage = entry.contribution / total * 100.0;
        }
    }

    entries.sort_by(|a, b| {
        b.contribution
            .total_cmp(&a.contribution)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    entries
}

/// Breakdown of a stored result against the session's locked deck.
pub fn breakdown_for(result: &SimulationResult, session: &Session) -> Vec<Contribution> {
    result
        .final_day()
        .map(|day| contribution_breakdown(day, &session.selected_tokens))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increased,
    Decreased,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenTrend {
    pub symbol: String,
    pub previous: Option<f64>,
    pub current: f64,
    pub trend: Trend,
}

/// Compare each token's score on `day` with the previous day. Tokens with no
/// previous value, and every token on day 1, are `Unchanged`. Returns `None`
/// if the result has no such day.
pub fn day_over_day(result: &SimulationResult, day: u32) -> Option<Vec<TokenTrend>> {
    let current = result.day(day)?;
    let previous = day.checked_sub(1).and_then(|d| result.day(d));

    let trends = current
        .tokens_performance
        .iter()
        .map(|p| {
            let prev = previous.and_then(|d| d.token(&p.symbol)).map(|q| q.final_score);
            let trend = match prev {
                Some(v) if p.final_score > v => Trend::Increased,
                Some(v) if p.final_score < v => Trend::Decreased,
                _ => Trend::Unchanged,
            };
            TokenTrend {
                symbol: p.symbol.clone(),
                previous: prev,
                current: p.final_score,
                trend,
            }
        })
        .collect();
    Some(trends)
}

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Weekday name for a 1-based simulated day, counting from the weekday of
/// `simulation_date`.
pub fn day_label(day: u32, simulation_date: DateTime<Utc>) -> &'static str {
    let first = simulation_date.weekday().num_days_from_monday();
    let offset = day.saturating_sub(1) % 7;
    WEEKDAYS[((first + offset) % 7) as usize]
}
