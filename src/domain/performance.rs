//! Simulation engine records and the aggregated result shapes.
//!
//! Field names follow the JSON exchanged with the simulation engine and the
//! presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One token's performance on one simulated day, as computed upstream.
/// `final_score` already folds in activity, price change and market-cap
/// factors; the aggregator only sums it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPerformance {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub raw_score: f64,
    #[serde(default)]
    pub activity_score: f64,
    #[serde(default)]
    pub daily_change_pct: f64,
    #[serde(default)]
    pub weekly_change_pct: f64,
    #[serde(default)]
    pub period_change_pct: f64,
    #[serde(default)]
    pub mc_factor: f64,
    pub final_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_rank: Option<u32>,
}

impl TokenPerformance {
    pub fn new(symbol: &str, final_score: f64) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            name: String::new(),
            raw_score: 0.0,
            activity_score: 0.0,
            daily_change_pct: 0.0,
            weekly_change_pct: 0.0,
            period_change_pct: 0.0,
            mc_factor: 0.0,
            final_score,
            activity_rank: None,
            change_rank: None,
        }
    }

    fn numbers(&self) -> [f64; 7] {
        [
            self.raw_score,
            self.activity_score,
            self.daily_change_pct,
            self.weekly_change_pct,
            self.period_change_pct,
            self.mc_factor,
            self.final_score,
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.numbers().iter().all(|v| v.is_finite())
    }
}

/// Raw engine output for one day. `market_position` is present when the
/// engine has already ranked the session against its peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPerformance {
    pub day: u32,
    pub tokens_performance: Vec<TokenPerformance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_position: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyScore {
    pub day: u32,
    pub score: f64,
    pub market_position: u32,
    pub tokens_performance: Vec<TokenPerformance>,
}

impl DailyScore {
    pub fn token(&self, symbol: &str) -> Option<&TokenPerformance> {
        self.tokens_performance
            .iter()
            .find(|p| p.symbol.eq_ignore_ascii_case(symbol))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub session_id: String,
    pub wallet_address: String,
    pub simulation_date: DateTime<Utc>,
    pub daily_scores: Vec<DailyScore>,
    pub final_score: f64,
    pub final_market_position: u32,
}

impl SimulationResult {
    pub fn final_day(&self) -> Option<&DailyScore> {
        self.daily_scores.last()
    }

    pub fn day(&self, day: u32) -> Option<&DailyScore> {
        self.daily_scores.iter().find(|d| d.day == day)
    }
}
