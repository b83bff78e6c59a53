//! Session lifecycle.
//!
//! A session is a locked deck bound to a wallet. It starts `Locked` and ends
//! either `Simulated` (a result was attached) or `Expired` (its TTL passed
//! first). Status never moves backwards. Expiry is evaluated when a session
//! is read; nothing runs in the background.

use crate::domain::deck::{self, DeckValidation};
use crate::domain::error::LeagueError;
use crate::domain::performance::SimulationResult;
use crate::domain::rules::{normalize_wallet, LeaguePolicy};
use crate::domain::scoring::PeerScores;
use crate::domain::token::{LockedToken, TokenCatalog};
use crate::ports::session_port::SessionPort;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Locked,
    Simulated,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Locked => "locked",
            SessionStatus::Simulated => "simulated",
            SessionStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Locked)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub wallet_address: String,
    pub selected_tokens: Vec<LockedToken>,
    pub total_tokens: usize,
    pub total_weight: u64,
    pub weight_limit: u64,
    pub weight_remaining: i64,
    pub locked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub simulation_completed: bool,
    pub final_score: Option<f64>,
    pub simulation_results: Option<SimulationResult>,
}

impl Session {
    pub fn symbols(&self) -> Vec<&str> {
        self.selected_tokens.iter().map(|t| t.symbol.as_str()).collect()
    }

    /// A locked session whose TTL has passed.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Locked && now > self.expires_at
    }

    /// Apply read-time expiry. Returns true if the status changed.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_past_expiry(now) {
            self.status = SessionStatus::Expired;
            return true;
        }
        false
    }
}

/// What happened on an attach call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttachOutcome {
    Attached,
    Replayed,
    Expired,
}

/// Owns session creation and every status transition.
pub struct SessionManager {
    store: Arc<dyn SessionPort + Send + Sync>,
    policy: LeaguePolicy,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionPort + Send + Sync>, policy: LeaguePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &LeaguePolicy {
        &self.policy
    }

    pub fn validate<S: AsRef<str>>(&self, candidate: &[S], catalog: &TokenCatalog) -> DeckValidation {
        deck::validate(candidate, catalog, &self.policy.rules)
    }

    /// Lock a deck for a wallet. An invalid deck creates nothing and fails
    /// with `InvalidDeck`. Every call gets a fresh session id, so locking
    /// again never touches earlier sessions.
    pub fn lock<S: AsRef<str>>(
        &self,
        wallet_address: &str,
        candidate: &[S],
        catalog: &TokenCatalog,
        now: DateTime<Utc>,
    ) -> Result<Session, LeagueError> {
        let wallet_address = normalize_wallet(wallet_address);
        if !self.policy.access.admits(&wallet_address) {
            warn!("lock refused for {wallet_address}: not on access list");
            return Err(LeagueError::NotWhitelisted { wallet_address });
        }

        let verdict = self.validate(candidate, catalog);
        if !verdict.is_valid {
            warn!("lock refused for {wallet_address}: {verdict}");
            return Err(LeagueError::InvalidDeck(Box::new(verdict)));
        }

        let mut selected_tokens = Vec::with_capacity(candidate.len());
        for symbol in candidate {
            let token = catalog
                .get(symbol.as_ref())
                .ok_or_else(|| LeagueError::Catalog {
                    reason: format!("token {} vanished from catalog", symbol.as_ref()),
                })?;
            selected_tokens.push(token.snapshot(now));
        }

        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            wallet_address,
            total_tokens: selected_tokens.len(),
            selected_tokens,
            total_weight: verdict.deck_analysis.total_weight,
            weight_limit: verdict.deck_analysis.weight_limit,
            weight_remaining: verdict.deck_analysis.weight_remaining,
            locked_at: now,
            expires_at: now + self.policy.session_ttl,
            status: SessionStatus::Locked,
            simulation_completed: false,
            final_score: None,
            simulation_results: None,
        };

        self.store.insert(&session)?;
        info!(
            "locked session {} for {} ({} / {} weight)",
            session.session_id, session.wallet_address, session.total_weight, session.weight_limit
        );
        Ok(session)
    }

    /// Attach a simulation result, moving the session to `Simulated`.
    ///
    /// Retrying with an identical result is a no-op that returns the stored
    /// session; a different result after completion fails with
    /// `AlreadySimulated`. A locked session past its expiry is marked
    /// `Expired` and the call fails with `SessionExpired`.
    pub fn attach_simulation(
        &self,
        session_id: &str,
        result: &SimulationResult,
        now: DateTime<Utc>,
    ) -> Result<Session, LeagueError> {
        if result.session_id != session_id {
            return Err(LeagueError::SessionMismatch {
                expected: session_id.to_string(),
                found: result.session_id.clone(),
            });
        }

        let mut outcome = AttachOutcome::Attached;
        let session = self.store.update(session_id, &mut |s: &mut Session| match s.status {
            SessionStatus::Simulated => {
                if s.simulation_results.as_ref() == Some(result) {
                    outcome = AttachOutcome::Replayed;
                    Ok(())
                } else {
                    Err(LeagueError::AlreadySimulated {
                        session_id: s.session_id.clone(),
                    })
                }
            }
            SessionStatus::Expired => Err(LeagueError::SessionExpired {
                session_id: s.session_id.clone(),
                expires_at: s.expires_at,
            }),
            SessionStatus::Locked if now > s.expires_at => {
                s.status = SessionStatus::Expired;
                outcome = AttachOutcome::Expired;
                Ok(())
            }
            SessionStatus::Locked => {
                s.status = SessionStatus::Simulated;
                s.simulation_completed = true;
                s.final_score = Some(result.final_score);
                s.simulation_results = Some(result.clone());
                outcome = AttachOutcome::Attached;
                Ok(())
            }
        });

        let session = match session {
            Ok(s) => s,
            Err(e) => {
                warn!("attach to {session_id} refused: {e}");
                return Err(e);
            }
        };

        match outcome {
            AttachOutcome::Attached => {
                info!(
                    "session {} simulated, final score {:.2}",
                    session.session_id, result.final_score
                );
                Ok(session)
            }
            AttachOutcome::Replayed => {
                debug!("session {} attach replayed", session.session_id);
                Ok(session)
            }
            AttachOutcome::Expired => {
                warn!("session {} expired before simulation", session.session_id);
                Err(LeagueError::SessionExpired {
                    session_id: session.session_id,
                    expires_at: session.expires_at,
                })
            }
        }
    }

    /// Fetch a session, marking it expired if its TTL has passed.
    pub fn get(&self, session_id: &str, now: DateTime<Utc>) -> Result<Session, LeagueError> {
        let session = self
            .store
            .load(session_id)?
            .ok_or_else(|| LeagueError::NotFound {
                session_id: session_id.to_string(),
            })?;

        if !session.is_past_expiry(now) {
            return Ok(session);
        }

        let session = self.store.update(session_id, &mut |s: &mut Session| {
            s.refresh_status(now);
            Ok(())
        })?;
        info!("session {} expired", session.session_id);
        Ok(session)
    }

    /// The stored result, or `NotFound` if the session never completed.
    pub fn results(&self, session_id: &str, now: DateTime<Utc>) -> Result<SimulationResult, LeagueError> {
        self.get(session_id, now)?
            .simulation_results
            .ok_or_else(|| LeagueError::NotFound {
                session_id: session_id.to_string(),
            })
    }

    /// Every session, with expiry reported as of `now`.
    pub fn list(&self, now: DateTime<Utc>) -> Result<Vec<Session>, LeagueError> {
        let mut sessions = self.store.list()?;
        for s in &mut sessions {
            s.refresh_status(now);
        }
        sessions.sort_by(|a, b| {
            a.locked_at
                .cmp(&b.locked_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions)
    }

    /// Daily scores of every simulated session except `exclude`.
    pub fn peer_scores(&self, exclude: &str) -> Result<PeerScores, LeagueError> {
        let mut peers = PeerScores::new();
        for s in self.store.list()? {
            if s.session_id == exclude {
                continue;
            }
            if let Some(result) = &s.simulation_results {
                for d in &result.daily_scores {
                    peers.entry(d.day).or_default().push(d.score);
                }
            }
        }
        Ok(peers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemorySessionStore;
    use crate::domain::performance::DailyScore;
    use crate::domain::rules::{AccessList, TournamentRules};
    use crate::domain::token::Token;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn catalog() -> TokenCatalog {
        let mut btc = Token::new("BTC", "Bitcoin", 50);
        btc.current_price = Some(65_000.0);
        TokenCatalog::new(vec![
            btc,
            Token::new("ETH", "Ethereum", 45),
            Token::new("BNB", "BNB", 40),
            Token::new("SOL", "Solana", 38),
            Token::new("ADA", "Cardano", 35),
            Token::new("XRP", "Ripple", 32),
        ])
        .unwrap()
    }

    fn manager() -> (SessionManager, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(store.clone(), LeaguePolicy::default());
        (manager, store)
    }

    const DECK: [&str; 5] = ["BTC", "ETH", "BNB", "SOL", "ADA"];

    fn result_for(session: &Session, final_score: f64) -> SimulationResult {
        SimulationResult {
            session_id: session.session_id.clone(),
            wallet_address: session.wallet_address.clone(),
            simulation_date: session.locked_at,
            daily_scores: vec![DailyScore {
                day: 1,
                score: final_score,
                market_position: 1,
                tokens_performance: vec![],
            }],
            final_score,
            final_market_position: 1,
        }
    }

    #[test]
    fn lock_creates_locked_session_with_snapshot() {
        let (manager, store) = manager();
        let now = at("2025-03-03T09:00:00Z");
        let session = manager.lock("0xABC", &DECK, &catalog(), now).unwrap();

        assert_eq!(session.status, SessionStatus::Locked);
        assert_eq!(session.wallet_address, "0xabc");
        assert_eq!(session.total_tokens, 5);
        assert_eq!(session.total_weight, 208);
        assert_eq!(session.weight_remaining, 42);
        assert_eq!(session.expires_at, now + Duration::hours(24));
        assert_eq!(session.selected_tokens[0].starting_price, Some(65_000.0));
        assert!(!session.simulation_completed);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn invalid_deck_creates_no_session() {
        let (manager, store) = manager();
        let err = manager
            .lock("0xabc", &["BTC", "BTC", "ETH"], &catalog(), at("2025-03-03T09:00:00Z"))
            .unwrap_err();
        match err {
            LeagueError::InvalidDeck(verdict) => {
                assert!(!verdict.validation_checks.correct_size);
                assert!(!verdict.validation_checks.no_duplicates);
            }
            other => panic!("expected InvalidDeck, got {other}"),
        }
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn relocking_creates_independent_session() {
        let (manager, _) = manager();
        let now = at("2025-03-03T09:00:00Z");
        let first = manager.lock("0xabc", &DECK, &catalog(), now).unwrap();
        let second = manager
            .lock("0xabc", &["XRP", "ETH", "BNB", "SOL", "ADA"], &catalog(), now)
            .unwrap();
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(
            manager.get(&first.session_id, now).unwrap().status,
            SessionStatus::Locked
        );
    }

    #[test]
    fn access_list_blocks_unknown_wallet() {
        let store = Arc::new(MemorySessionStore::new());
        let policy = LeaguePolicy {
            access: AccessList::from_wallets(["0xAAA"]),
            ..LeaguePolicy::default()
        };
        let manager = SessionManager::new(store.clone(), policy);
        let now = at("2025-03-03T09:00:00Z");

        let err = manager.lock("0xbbb", &DECK, &catalog(), now).unwrap_err();
        assert!(matches!(err, LeagueError::NotWhitelisted { .. }));
        assert_eq!(store.len(), 0);

        assert!(manager.lock("0xaaa", &DECK, &catalog(), now).is_ok());
    }

    #[test]
    fn small_weight_limit_from_policy() {
        let store = Arc::new(MemorySessionStore::new());
        let policy = LeaguePolicy {
            rules: TournamentRules::new(5, 28).unwrap(),
            ..LeaguePolicy::default()
        };
        let manager = SessionManager::new(store, policy);
        let err = manager
            .lock("0xabc", &DECK, &catalog(), at("2025-03-03T09:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, LeagueError::InvalidDeck(v) if v.deck_analysis.weight_remaining == -180));
    }

    #[test]
    fn attach_moves_to_simulated() {
        let (manager, _) = manager();
        let now = at("2025-03-03T09:00:00Z");
        let session = manager.lock("0xabc", &DECK, &catalog(), now).unwrap();
        let result = result_for(&session, 120.0);

        let updated = manager
            .attach_simulation(&session.session_id, &result, now + Duration::hours(1))
            .unwrap();
        assert_eq!(updated.status, SessionStatus::Simulated);
        assert!(updated.simulation_completed);
        assert_eq!(updated.final_score, Some(120.0));
        assert_eq!(updated.simulation_results.as_ref(), Some(&result));
    }

    #[test]
    fn attach_same_result_twice_is_noop() {
        let (manager, _) = manager();
        let now = at("2025-03-03T09:00:00Z");
        let session = manager.lock("0xabc", &DECK, &catalog(), now).unwrap();
        let result = result_for(&session, 120.0);

        let first = manager
            .attach_simulation(&session.session_id, &result, now)
            .unwrap();
        let second = manager
            .attach_simulation(&session.session_id, &result, now + Duration::hours(30))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn attach_different_result_fails() {
        let (manager, _) = manager();
        let now = at("2025-03-03T09:00:00Z");
        let session = manager.lock("0xabc", &DECK, &catalog(), now).unwrap();
        manager
            .attach_simulation(&session.session_id, &result_for(&session, 120.0), now)
            .unwrap();

        let err = manager
            .attach_simulation(&session.session_id, &result_for(&session, 99.0), now)
            .unwrap_err();
        assert!(matches!(err, LeagueError::AlreadySimulated { .. }));
        assert_eq!(
            manager.get(&session.session_id, now).unwrap().final_score,
            Some(120.0)
        );
    }

    #[test]
    fn attach_after_expiry_fails_and_marks_expired() {
        let (manager, _) = manager();
        let now = at("2025-03-03T09:00:00Z");
        let session = manager.lock("0xabc", &DECK, &catalog(), now).unwrap();
        let late = now + Duration::hours(25);

        let err = manager
            .attach_simulation(&session.session_id, &result_for(&session, 1.0), late)
            .unwrap_err();
        assert!(matches!(err, LeagueError::SessionExpired { .. }));

        // Expired is terminal, even if a caller's clock is behind.
        let stored = manager.get(&session.session_id, now).unwrap();
        assert_eq!(stored.status, SessionStatus::Expired);
        let err = manager
            .attach_simulation(&session.session_id, &result_for(&session, 1.0), now)
            .unwrap_err();
        assert!(matches!(err, LeagueError::SessionExpired { .. }));
    }

    #[test]
    fn attach_at_exact_expiry_is_allowed() {
        let (manager, _) = manager();
        let now = at("2025-03-03T09:00:00Z");
        let session = manager.lock("0xabc", &DECK, &catalog(), now).unwrap();
        let updated = manager
            .attach_simulation(&session.session_id, &result_for(&session, 1.0), session.expires_at)
            .unwrap();
        assert_eq!(updated.status, SessionStatus::Simulated);
    }

    #[test]
    fn attach_rejects_result_for_other_session() {
        let (manager, _) = manager();
        let now = at("2025-03-03T09:00:00Z");
        let session = manager.lock("0xabc", &DECK, &catalog(), now).unwrap();
        let mut result = result_for(&session, 1.0);
        result.session_id = "other".into();
        let err = manager
            .attach_simulation(&session.session_id, &result, now)
            .unwrap_err();
        assert!(matches!(err, LeagueError::SessionMismatch { .. }));
    }

    #[test]
    fn get_unknown_session_is_not_found() {
        let (manager, _) = manager();
        let err = manager.get("nope", at("2025-03-03T09:00:00Z")).unwrap_err();
        assert!(matches!(err, LeagueError::NotFound { session_id } if session_id == "nope"));
    }

    #[test]
    fn get_marks_expired_lazily() {
        let (manager, store) = manager();
        let now = at("2025-03-03T09:00:00Z");
        let session = manager.lock("0xabc", &DECK, &catalog(), now).unwrap();

        let fetched = manager.get(&session.session_id, now + Duration::hours(24)).unwrap();
        assert_eq!(fetched.status, SessionStatus::Locked);

        let fetched = manager
            .get(&session.session_id, now + Duration::hours(24) + Duration::seconds(1))
            .unwrap();
        assert_eq!(fetched.status, SessionStatus::Expired);
        assert_eq!(
            store.load(&session.session_id).unwrap().unwrap().status,
            SessionStatus::Expired
        );
    }

    #[test]
    fn simulated_session_never_expires() {
        let (manager, _) = manager();
        let now = at("2025-03-03T09:00:00Z");
        let session = manager.lock("0xabc", &DECK, &catalog(), now).unwrap();
        manager
            .attach_simulation(&session.session_id, &result_for(&session, 5.0), now)
            .unwrap();
        let fetched = manager
            .get(&session.session_id, now + Duration::days(30))
            .unwrap();
        assert_eq!(fetched.status, SessionStatus::Simulated);
    }

    #[test]
    fn results_require_completed_simulation() {
        let (manager, _) = manager();
        let now = at("2025-03-03T09:00:00Z");
        let session = manager.lock("0xabc", &DECK, &catalog(), now).unwrap();
        assert!(matches!(
            manager.results(&session.session_id, now),
            Err(LeagueError::NotFound { .. })
        ));

        let result = result_for(&session, 7.5);
        manager
            .attach_simulation(&session.session_id, &result, now)
            .unwrap();
        assert_eq!(manager.results(&session.session_id, now).unwrap(), result);
    }

    #[test]
    fn list_reports_expiry_and_orders_by_lock_time() {
        let (manager, _) = manager();
        let t0 = at("2025-03-03T09:00:00Z");
        let first = manager.lock("0xabc", &DECK, &catalog(), t0).unwrap();
        let second = manager
            .lock("0xdef", &DECK, &catalog(), t0 + Duration::hours(12))
            .unwrap();

        let sessions = manager.list(t0 + Duration::hours(30)).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, first.session_id);
        assert_eq!(sessions[0].status, SessionStatus::Expired);
        assert_eq!(sessions[1].session_id, second.session_id);
        assert_eq!(sessions[1].status, SessionStatus::Locked);
    }

    #[test]
    fn peer_scores_skip_excluded_and_unsimulated() {
        let (manager, _) = manager();
        let now = at("2025-03-03T09:00:00Z");
        let a = manager.lock("0xa", &DECK, &catalog(), now).unwrap();
        let b = manager.lock("0xb", &DECK, &catalog(), now).unwrap();
        let _c = manager.lock("0xc", &DECK, &catalog(), now).unwrap();
        manager
            .attach_simulation(&a.session_id, &result_for(&a, 10.0), now)
            .unwrap();
        manager
            .attach_simulation(&b.session_id, &result_for(&b, 20.0), now)
            .unwrap();

        let peers = manager.peer_scores(&a.session_id).unwrap();
        assert_eq!(peers.get(&1), Some(&vec![20.0]));
        assert_eq!(peers.len(), 1);
    }
}
