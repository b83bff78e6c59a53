//! Key/value store for per-wallet best scores.

use crate::domain::error::LeagueError;

pub trait ScorePort {
    fn get(&self, key: &str) -> Result<Option<String>, LeagueError>;
    fn set(&self, key: &str, value: &str) -> Result<(), LeagueError>;

    /// Store `score` under `key` unless the stored value is already greater
    /// or equal. The read and the write must happen atomically. A missing or
    /// unparseable stored value counts as absent. Returns true when written.
    fn set_max(&self, key: &str, score: f64) -> Result<bool, LeagueError>;
}
