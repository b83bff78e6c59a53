//! Tournament rules and the policy a session manager is constructed with.

use crate::domain::error::LeagueError;
use chrono::Duration;
use serde::Serialize;
use std::collections::HashSet;

pub const DEFAULT_DECK_SIZE: usize = 5;
pub const DEFAULT_WEIGHT_LIMIT: u32 = 250;
pub const DEFAULT_DURATION_DAYS: u32 = 7;
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TournamentRules {
    pub deck_size: usize,
    pub weight_limit: u32,
    pub duration_days: u32,
}

impl TournamentRules {
    pub fn new(deck_size: usize, weight_limit: u32) -> Result<Self, LeagueError> {
        if deck_size == 0 {
            return Err(LeagueError::ConfigInvalid {
                section: "tournament".to_string(),
                key: "deck_size".to_string(),
                reason: "deck_size must be positive".to_string(),
            });
        }
        if weight_limit == 0 {
            return Err(LeagueError::ConfigInvalid {
                section: "tournament".to_string(),
                key: "weight_limit".to_string(),
                reason: "weight_limit must be positive".to_string(),
            });
        }
        Ok(Self {
            deck_size,
            weight_limit,
            duration_days: DEFAULT_DURATION_DAYS,
        })
    }
}

impl Default for TournamentRules {
    fn default() -> Self {
        Self {
            deck_size: DEFAULT_DECK_SIZE,
            weight_limit: DEFAULT_WEIGHT_LIMIT,
            duration_days: DEFAULT_DURATION_DAYS,
        }
    }
}

/// Wallets admitted to the tournament. An empty list admits everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessList {
    wallets: HashSet<String>,
}

impl AccessList {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn from_wallets<I, S>(wallets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wallets = wallets
            .into_iter()
            .map(|w| normalize_wallet(w.as_ref()))
            .filter(|w| !w.is_empty())
            .collect();
        Self { wallets }
    }

    pub fn is_open(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn admits(&self, wallet_address: &str) -> bool {
        self.is_open() || self.wallets.contains(&normalize_wallet(wallet_address))
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

/// Wallet addresses are opaque keys compared case-insensitively.
pub fn normalize_wallet(wallet_address: &str) -> String {
    wallet_address.trim().to_lowercase()
}

/// Everything a session manager needs besides storage.
#[derive(Debug, Clone)]
pub struct LeaguePolicy {
    pub rules: TournamentRules,
    pub session_ttl: Duration,
    pub access: AccessList,
}

impl Default for LeaguePolicy {
    fn default() -> Self {
        Self {
            rules: TournamentRules::default(),
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            access: AccessList::open(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules() {
        let rules = TournamentRules::default();
        assert_eq!(rules.deck_size, 5);
        assert_eq!(rules.weight_limit, 250);
        assert_eq!(rules.duration_days, 7);
    }

    #[test]
    fn zero_deck_size_rejected() {
        let err = TournamentRules::new(0, 250).unwrap_err();
        assert!(matches!(err, LeagueError::ConfigInvalid { key, .. } if key == "deck_size"));
    }

    #[test]
    fn zero_weight_limit_rejected() {
        let err = TournamentRules::new(5, 0).unwrap_err();
        assert!(matches!(err, LeagueError::ConfigInvalid { key, .. } if key == "weight_limit"));
    }

    #[test]
    fn open_access_list_admits_anyone() {
        let access = AccessList::open();
        assert!(access.is_open());
        assert!(access.admits("0xanything"));
    }

    #[test]
    fn access_list_compares_case_insensitively() {
        let access = AccessList::from_wallets(["0xfD0634a7cC9288B52C2a7377dbf1efA5f3212ec6"]);
        assert!(access.admits("0xfd0634a7cc9288b52c2a7377dbf1efa5f3212ec6"));
        assert!(access.admits(" 0XFD0634A7CC9288B52C2A7377DBF1EFA5F3212EC6 "));
        assert!(!access.admits("0x1234567890123456789012345678901234567890"));
    }

    #[test]
    fn blank_entries_do_not_close_the_list() {
        let access = AccessList::from_wallets(["", "  "]);
        assert!(access.is_open());
    }

    #[test]
    fn default_policy_ttl_is_one_day() {
        let policy = LeaguePolicy::default();
        assert_eq!(policy.session_ttl, Duration::hours(24));
    }
}
