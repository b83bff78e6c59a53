//! Deck validation.
//!
//! [`validate`] runs every check and reports all failures together so the
//! caller gets a full diagnostic in one pass. [`can_add`] is the incremental
//! predicate used while a deck is being built; it is assembled from the same
//! check helpers so the two can never disagree.

use crate::domain::error::ValidationFailure;
use crate::domain::rules::TournamentRules;
use crate::domain::token::{Token, TokenCatalog};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckValidation {
    pub is_valid: bool,
    pub deck_analysis: DeckAnalysis,
    pub token_breakdown: Vec<TokenWeight>,
    pub validation_checks: ValidationChecks,
    pub failures: Vec<ValidationFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckAnalysis {
    pub total_tokens: usize,
    pub total_weight: u64,
    pub weight_limit: u64,
    /// Negative when the deck is over budget.
    pub weight_remaining: i64,
    /// `total_weight / weight_limit`.
    pub weight_utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenWeight {
    pub symbol: String,
    pub weight: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationChecks {
    pub correct_size: bool,
    pub no_duplicates: bool,
    pub valid_tokens: bool,
    pub within_weight_limit: bool,
}

impl DeckValidation {
    pub fn total_weight(&self) -> u64 {
        self.deck_analysis.total_weight
    }

    pub fn weight_remaining(&self) -> i64 {
        self.deck_analysis.weight_remaining
    }
}

impl fmt::Display for DeckValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid {
            return write!(
                f,
                "valid deck ({} / {} weight)",
                self.deck_analysis.total_weight, self.deck_analysis.weight_limit
            );
        }
        let reasons: Vec<String> = self.failures.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", reasons.join("; "))
    }
}

/// Validate a candidate deck against the catalog and tournament rules.
pub fn validate<S: AsRef<str>>(
    candidate: &[S],
    catalog: &TokenCatalog,
    rules: &TournamentRules,
) -> DeckValidation {
    let symbols = normalize_symbols(candidate);
    let weight_limit = u64::from(rules.weight_limit);

    let duplicates = find_duplicates(&symbols);
    let unknown = find_unknown(&symbols, catalog);
    let total_weight = total_weight(&symbols, catalog);

    let validation_checks = ValidationChecks {
        correct_size: symbols.len() == rules.deck_size,
        no_duplicates: duplicates.is_empty(),
        valid_tokens: unknown.is_empty(),
        within_weight_limit: within_weight_limit(total_weight, rules),
    };

    let mut failures = Vec::new();
    if !validation_checks.correct_size {
        failures.push(ValidationFailure::SizeMismatch {
            expected: rules.deck_size,
            actual: symbols.len(),
        });
    }
    if !validation_checks.no_duplicates {
        failures.push(ValidationFailure::DuplicateToken {
            symbols: duplicates,
        });
    }
    if !validation_checks.valid_tokens {
        failures.push(ValidationFailure::UnknownToken { symbols: unknown });
    }
    if !validation_checks.within_weight_limit {
        failures.push(ValidationFailure::WeightExceeded {
            total_weight,
            weight_limit,
            overage: total_weight - weight_limit,
        });
    }

    let token_breakdown = symbols
        .iter()
        .filter_map(|s| {
            catalog.weight_of(s).map(|weight| TokenWeight {
                symbol: s.clone(),
                weight,
            })
        })
        .collect();

    DeckValidation {
        is_valid: failures.is_empty(),
        deck_analysis: DeckAnalysis {
            total_tokens: symbols.len(),
            total_weight,
            weight_limit,
            weight_remaining: weight_limit as i64 - total_weight as i64,
            weight_utilization: total_weight as f64 / weight_limit as f64,
        },
        token_breakdown,
        validation_checks,
        failures,
    }
}

/// Whether `token` may join `current_deck` without breaking the duplicate,
/// size or weight rules. Unknown tokens cannot reach this point since the
/// caller already holds a catalog entry.
pub fn can_add(token: &Token, current_deck: &[Token], rules: &TournamentRules) -> bool {
    let mut symbols: Vec<String> = current_deck.iter().map(|t| normalize(&t.symbol)).collect();
    symbols.push(normalize(&token.symbol));

    let total: u64 = current_deck
        .iter()
        .chain(std::iter::once(token))
        .map(|t| u64::from(t.tournament_weight))
        .sum();

    symbols.len() <= rules.deck_size
        && find_duplicates(&symbols).is_empty()
        && within_weight_limit(total, rules)
}

/// Catalog tokens that [`can_add`] would currently accept.
pub fn selectable_tokens<'a>(
    current_deck: &[Token],
    catalog: &'a TokenCatalog,
    rules: &TournamentRules,
) -> Vec<&'a Token> {
    catalog
        .tokens()
        .iter()
        .filter(|t| can_add(t, current_deck, rules))
        .collect()
}

fn normalize(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn normalize_symbols<S: AsRef<str>>(candidate: &[S]) -> Vec<String> {
    candidate.iter().map(|s| normalize(s.as_ref())).collect()
}

/// Each repeated symbol once, in order of its first repeat.
fn find_duplicates(symbols: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for symbol in symbols {
        if !seen.insert(symbol.as_str()) && !duplicates.contains(symbol) {
            duplicates.push(symbol.clone());
        }
    }
    duplicates
}

fn find_unknown(symbols: &[String], catalog: &TokenCatalog) -> Vec<String> {
    let mut unknown: Vec<String> = Vec::new();
    for symbol in symbols {
        if !catalog.contains(symbol) && !unknown.contains(symbol) {
            unknown.push(symbol.clone());
        }
    }
    unknown
}

/// Sum over every occurrence; unknown symbols weigh nothing.
fn total_weight(symbols: &[String], catalog: &TokenCatalog) -> u64 {
    symbols
        .iter()
        .filter_map(|s| catalog.weight_of(s))
        .map(u64::from)
        .sum()
}

fn within_weight_limit(total_weight: u64, rules: &TournamentRules) -> bool {
    total_weight <= u64::from(rules.weight_limit)
}
