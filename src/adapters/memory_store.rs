//! In-process session and score stores.

use crate::domain::error::LeagueError;
use crate::domain::leaderboard::parse_score;
use crate::domain::session::Session;
use crate::ports::score_port::ScorePort;
use crate::ports::session_port::SessionPort;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.guard().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>, LeagueError> {
        self.sessions.lock().map_err(|e| LeagueError::Storage {
            reason: format!("session store poisoned: {e}"),
        })
    }
}

impl SessionPort for MemorySessionStore {
    fn insert(&self, session: &Session) -> Result<(), LeagueError> {
        let mut sessions = self.guard()?;
        if sessions.contains_key(&session.session_id) {
            return Err(LeagueError::Storage {
                reason: format!("session {} already exists", session.session_id),
            });
        }
        sessions.insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<Option<Session>, LeagueError> {
        Ok(self.guard()?.get(session_id).cloned())
    }

    fn list(&self) -> Result<Vec<Session>, LeagueError> {
        Ok(self.guard()?.values().cloned().collect())
    }

    fn update(
        &self,
        session_id: &str,
        apply: &mut dyn FnMut(&mut Session) -> Result<(), LeagueError>,
    ) -> Result<Session, LeagueError> {
        let mut sessions = self.guard()?;
        let stored = sessions
            .get_mut(session_id)
            .ok_or_else(|| LeagueError::NotFound {
                session_id: session_id.to_string(),
            })?;
        // Work on a copy so a failed apply leaves the record untouched.
        let mut draft = stored.clone();
        apply(&mut draft)?;
        *stored = draft.clone();
        Ok(draft)
    }
}

#[derive(Default)]
pub struct MemoryScoreStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, LeagueError> {
        self.values.lock().map_err(|e| LeagueError::Storage {
            reason: format!("score store poisoned: {e}"),
        })
    }
}

impl ScorePort for MemoryScoreStore {
    fn get(&self, key: &str) -> Result<Option<String>, LeagueError> {
        Ok(self.guard()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LeagueError> {
        self.guard()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_max(&self, key: &str, score: f64) -> Result<bool, LeagueError> {
        let mut values = self.guard()?;
        if let Some(best) = values.get(key).and_then(|raw| parse_score(raw)) {
            if best >= score {
                return Ok(false);
            }
        }
        values.insert(key.to_string(), score.to_string());
        Ok(true)
    }
}
