//! Token reference data and the read-only token catalog.

use crate::domain::error::LeagueError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A tradable token as supplied by the catalog provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub name: String,
    pub tournament_weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}

impl Token {
    pub fn new(symbol: &str, name: &str, tournament_weight: u32) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            name: name.to_string(),
            tournament_weight,
            current_price: None,
            market_cap: None,
        }
    }

    pub fn tier(&self) -> Option<WeightTier> {
        WeightTier::for_weight(self.tournament_weight)
    }

    /// Freeze the token's current weight and pricing into a deck snapshot.
    pub fn snapshot(&self, locked_at: DateTime<Utc>) -> LockedToken {
        LockedToken {
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            tournament_weight: self.tournament_weight,
            starting_price: self.current_price,
            starting_market_cap: self.market_cap,
            snapshot_at: locked_at,
        }
    }
}

/// A token as it was when a deck was locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedToken {
    pub symbol: String,
    pub name: String,
    pub tournament_weight: u32,
    pub starting_price: Option<f64>,
    pub starting_market_cap: Option<f64>,
    pub snapshot_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightTier {
    Giants,
    Major,
    Mid,
    Emerging,
    Speculative,
}

impl WeightTier {
    pub fn for_weight(weight: u32) -> Option<Self> {
        match weight {
            80..=100 => Some(WeightTier::Giants),
            60..=79 => Some(WeightTier::Major),
            40..=59 => Some(WeightTier::Mid),
            25..=39 => Some(WeightTier::Emerging),
            15..=24 => Some(WeightTier::Speculative),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeightTier::Giants => "giants",
            WeightTier::Major => "major",
            WeightTier::Mid => "mid",
            WeightTier::Emerging => "emerging",
            WeightTier::Speculative => "speculative",
        }
    }
}

/// Read-only lookup over the tokens eligible for a tournament.
#[derive(Debug, Clone, Default)]
pub struct TokenCatalog {
    tokens: Vec<Token>,
    index: HashMap<String, usize>,
}

impl TokenCatalog {
    /// Build a catalog, normalising symbols to uppercase. Duplicate symbols
    /// and non-positive weights are rejected.
    pub fn new(tokens: Vec<Token>) -> Result<Self, LeagueError> {
        let mut catalog = TokenCatalog {
            tokens: Vec::with_capacity(tokens.len()),
            index: HashMap::with_capacity(tokens.len()),
        };

        for mut token in tokens {
            token.symbol = token.symbol.trim().to_uppercase();
            if token.symbol.is_empty() {
                return Err(LeagueError::Catalog {
                    reason: "token with empty symbol".to_string(),
                });
            }
            if token.tournament_weight == 0 {
                return Err(LeagueError::Catalog {
                    reason: format!("token {} has a zero tournament_weight", token.symbol),
                });
            }
            if catalog.index.contains_key(&token.symbol) {
                return Err(LeagueError::Catalog {
                    reason: format!("duplicate token {}", token.symbol),
                });
            }
            catalog
                .index
                .insert(token.symbol.clone(), catalog.tokens.len());
            catalog.tokens.push(token);
        }

        Ok(catalog)
    }

    pub fn get(&self, symbol: &str) -> Option<&Token> {
        self.index
            .get(&symbol.trim().to_uppercase())
            .map(|&i| &self.tokens[i])
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    pub fn weight_of(&self, symbol: &str) -> Option<u32> {
        self.get(symbol).map(|t| t.tournament_weight)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Heaviest first, symbol ascending within a weight.
    pub fn by_weight_desc(&self) -> Vec<&Token> {
        let mut sorted: Vec<&Token> = self.tokens.iter().collect();
        sorted.sort_by(|a, b| {
            b.tournament_weight
                .cmp(&a.tournament_weight)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> TokenCatalog {
        TokenCatalog::new(vec![
            Token::new("BTC", "Bitcoin", 50),
            Token::new("eth", "Ethereum", 45),
            Token::new("DOGE", "Dogecoin", 28),
        ])
        .unwrap()
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = sample_catalog();
        assert_eq!(catalog.get("btc").unwrap().name, "Bitcoin");
        assert_eq!(catalog.get("ETH").unwrap().symbol, "ETH");
        assert_eq!(catalog.weight_of(" doge "), Some(28));
        assert!(catalog.get("XRP").is_none());
    }

    #[test]
    fn duplicate_symbols_rejected() {
        let result = TokenCatalog::new(vec![
            Token::new("BTC", "Bitcoin", 50),
            Token::new("btc", "Bitcoin again", 40),
        ]);
        assert!(matches!(result, Err(LeagueError::Catalog { .. })));
    }

    #[test]
    fn zero_weight_rejected() {
        let result = TokenCatalog::new(vec![Token::new("BTC", "Bitcoin", 0)]);
        assert!(matches!(result, Err(LeagueError::Catalog { reason }) if reason.contains("BTC")));
    }

    #[test]
    fn by_weight_desc_orders_heaviest_first() {
        let catalog = sample_catalog();
        let symbols: Vec<&str> = catalog
            .by_weight_desc()
            .iter()
            .map(|t| t.symbol.as_str())
            .collect();
        assert_eq!(symbols, vec!["BTC", "ETH", "DOGE"]);
    }

    #[test]
    fn weight_tier_boundaries() {
        assert_eq!(WeightTier::for_weight(100), Some(WeightTier::Giants));
        assert_eq!(WeightTier::for_weight(80), Some(WeightTier::Giants));
        assert_eq!(WeightTier::for_weight(79), Some(WeightTier::Major));
        assert_eq!(WeightTier::for_weight(45), Some(WeightTier::Mid));
        assert_eq!(WeightTier::for_weight(25), Some(WeightTier::Emerging));
        assert_eq!(WeightTier::for_weight(15), Some(WeightTier::Speculative));
        assert_eq!(WeightTier::for_weight(14), None);
        assert_eq!(WeightTier::for_weight(101), None);
    }

    #[test]
    fn snapshot_copies_weight_and_price() {
        let mut token = Token::new("SOL", "Solana", 38);
        token.current_price = Some(142.5);
        let at = DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let locked = token.snapshot(at);
        assert_eq!(locked.tournament_weight, 38);
        assert_eq!(locked.starting_price, Some(142.5));
        assert_eq!(locked.starting_market_cap, None);
        assert_eq!(locked.snapshot_at, at);
    }
}
