#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;
use tokenleague::domain::error::LeagueError;
use tokenleague::domain::performance::{DayPerformance, TokenPerformance};
use tokenleague::domain::session::Session;
use tokenleague::domain::token::{Token, TokenCatalog};
use tokenleague::ports::simulation_port::SimulationPort;

pub const DECK: [&str; 5] = ["BTC", "ETH", "BNB", "SOL", "ADA"];

pub const CATALOG_CSV: &str = "\
symbol,name,tournament_weight,current_price,market_cap
BTC,Bitcoin,50,65000,1280000000000
ETH,Ethereum,45,3400,410000000000
BNB,BNB,40,580,86000000000
SOL,Solana,38,150,68000000000
ADA,Cardano,35,0.45,16000000000
XRP,Ripple,32,0.6,33000000000
DOGE,Dogecoin,28,0.12,17000000000
PEPE,Pepe,18,,
";

pub fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

/// Monday morning, the reference clock for most tests.
pub fn monday() -> DateTime<Utc> {
    at("2025-03-03T09:00:00Z")
}

pub fn catalog() -> TokenCatalog {
    let tokens = vec![
        priced("BTC", "Bitcoin", 50, 65_000.0),
        priced("ETH", "Ethereum", 45, 3_400.0),
        priced("BNB", "BNB", 40, 580.0),
        priced("SOL", "Solana", 38, 150.0),
        priced("ADA", "Cardano", 35, 0.45),
        priced("XRP", "Ripple", 32, 0.6),
        priced("DOGE", "Dogecoin", 28, 0.12),
        Token::new("PEPE", "Pepe", 18),
    ];
    TokenCatalog::new(tokens).unwrap()
}

fn priced(symbol: &str, name: &str, weight: u32, price: f64) -> Token {
    let mut t = Token::new(symbol, name, weight);
    t.current_price = Some(price);
    t
}

pub fn perf(symbol: &str, final_score: f64) -> TokenPerformance {
    TokenPerformance::new(symbol, final_score)
}

pub fn day(n: u32, scores: &[(&str, f64)]) -> DayPerformance {
    DayPerformance {
        day: n,
        tokens_performance: scores.iter().map(|(s, v)| perf(s, *v)).collect(),
        market_position: None,
    }
}

/// Three days of period-to-date scores ending at 120 (BTC 80, ETH 40).
pub fn three_day_feed() -> Vec<DayPerformance> {
    vec![
        day(1, &[("BTC", 10.0), ("ETH", 5.0)]),
        day(2, &[("BTC", 30.0), ("ETH", 15.0)]),
        day(3, &[("BTC", 80.0), ("ETH", 40.0)]),
    ]
}

/// Simulation engine stand-in: a default feed plus per-session overrides.
pub struct MockFeed {
    pub default: Vec<DayPerformance>,
    pub per_session: Mutex<HashMap<String, Vec<DayPerformance>>>,
    pub errors: HashMap<String, String>,
}

impl MockFeed {
    pub fn new(default: Vec<DayPerformance>) -> Self {
        Self {
            default,
            per_session: Mutex::new(HashMap::new()),
            errors: HashMap::new(),
        }
    }

    pub fn with_session(self, session_id: &str, days: Vec<DayPerformance>) -> Self {
        self.per_session
            .lock()
            .unwrap()
            .insert(session_id.to_string(), days);
        self
    }

    pub fn with_error(mut self, session_id: &str, reason: &str) -> Self {
        self.errors.insert(session_id.to_string(), reason.to_string());
        self
    }
}

impl SimulationPort for MockFeed {
    fn daily_performance(&self, session: &Session) -> Result<Vec<DayPerformance>, LeagueError> {
        if let Some(reason) = self.errors.get(&session.session_id) {
            return Err(LeagueError::SimulationFeed {
                session_id: session.session_id.clone(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .per_session
            .lock()
            .unwrap()
            .get(&session.session_id)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}

pub fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
