//! SQLite storage adapter for sessions and best scores.
//!
//! Sessions are stored as a JSON body plus a few indexed columns. Updates run
//! inside an IMMEDIATE transaction, which takes the database write lock
//! before the read, so concurrent updates of the same session serialize.

use crate::domain::error::LeagueError;
use crate::domain::leaderboard::parse_score;
use crate::domain::session::Session;
use crate::ports::config_port::ConfigPort;
use crate::ports::score_port::ScorePort;
use crate::ports::session_port::SessionPort;
use log::debug;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LeagueError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| LeagueError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let raw_pool_size = config.get_int("sqlite", "pool_size", 4);
        let pool_size = u32::try_from(raw_pool_size)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| LeagueError::ConfigInvalid {
                section: "sqlite".into(),
                key: "pool_size".into(),
                reason: format!("pool_size must be between 1 and {}, got {raw_pool_size}", u32::MAX),
            })?;

        let manager = SqliteConnectionManager::file(&db_path)
            .with_init(|c| c.busy_timeout(BUSY_TIMEOUT));
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| LeagueError::Storage {
                    reason: e.to_string(),
                })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, LeagueError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| LeagueError::Storage {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), LeagueError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                wallet_address TEXT NOT NULL,
                status TEXT NOT NULL,
                locked_at TEXT NOT NULL,
                body TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_wallet ON sessions(wallet_address);
            CREATE TABLE IF NOT EXISTS scores (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(query_err)?;

        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, LeagueError> {
        self.pool.get().map_err(|e: r2d2::Error| LeagueError::Storage {
            reason: e.to_string(),
        })
    }
}

fn query_err(e: rusqlite::Error) -> LeagueError {
    LeagueError::StorageQuery {
        reason: e.to_string(),
    }
}

fn encode(session: &Session) -> Result<String, LeagueError> {
    serde_json::to_string(session).map_err(|e| LeagueError::StorageQuery {
        reason: format!("failed to encode session {}: {e}", session.session_id),
    })
}

fn decode(body: &str) -> Result<Session, LeagueError> {
    serde_json::from_str(body).map_err(|e| LeagueError::StorageQuery {
        reason: format!("corrupt session record: {e}"),
    })
}

impl SessionPort for SqliteAdapter {
    fn insert(&self, session: &Session) -> Result<(), LeagueError> {
        let conn = self.conn()?;
        let body = encode(session)?;
        conn.execute(
            "INSERT INTO sessions (session_id, wallet_address, status, locked_at, body)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.session_id,
                session.wallet_address,
                session.status.as_str(),
                session.locked_at.to_rfc3339(),
                body
            ],
        )
        .map_err(query_err)?;
        debug!("inserted session {}", session.session_id);
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<Option<Session>, LeagueError> {
        let conn = self.conn()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_err)?;
        body.as_deref().map(decode).transpose()
    }

    fn list(&self) -> Result<Vec<Session>, LeagueError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT body FROM sessions ORDER BY locked_at ASC, session_id ASC")
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(query_err)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(decode(&row.map_err(query_err)?)?);
        }
        Ok(sessions)
    }

    fn update(
        &self,
        session_id: &str,
        apply: &mut dyn FnMut(&mut Session) -> Result<(), LeagueError>,
    ) -> Result<Session, LeagueError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(query_err)?;

        let body: Option<String> = tx
            .query_row(
                "SELECT body FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_err)?;

        let mut session = match body {
            Some(b) => decode(&b)?,
            None => {
                return Err(LeagueError::NotFound {
                    session_id: session_id.to_string(),
                })
            }
        };

        // An error here drops the transaction, which rolls it back.
        apply(&mut session)?;

        tx.execute(
            "UPDATE sessions SET status = ?2, body = ?3 WHERE session_id = ?1",
            params![session_id, session.status.as_str(), encode(&session)?],
        )
        .map_err(query_err)?;
        tx.commit().map_err(query_err)?;

        debug!("updated session {session_id} -> {}", session.status.as_str());
        Ok(session)
    }
}

impl ScorePort for SqliteAdapter {
    fn get(&self, key: &str) -> Result<Option<String>, LeagueError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT value FROM scores WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(query_err)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LeagueError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO scores (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(query_err)?;
        Ok(())
    }

    fn set_max(&self, key: &str, score: f64) -> Result<bool, LeagueError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(query_err)?;

        let stored: Option<String> = tx
            .query_row(
                "SELECT value FROM scores WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_err)?;

        if let Some(best) = stored.as_deref().and_then(parse_score) {
            if best >= score {
                return Ok(false);
            }
        }

        tx.execute(
            "INSERT INTO scores (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, score.to_string()],
        )
        .map_err(query_err)?;
        tx.commit().map_err(query_err)?;
        Ok(true)
    }
}
