//! Session persistence port.

use crate::domain::error::LeagueError;
use crate::domain::session::Session;

/// Storage for locked sessions.
///
/// Implementations must make [`SessionPort::update`] atomic per session: the
/// closure sees the current record and no other writer may interleave
/// between its read and the write-back. Readers never observe a partially
/// written session.
pub trait SessionPort {
    /// Store a new session. Fails if the id already exists.
    fn insert(&self, session: &Session) -> Result<(), LeagueError>;

    fn load(&self, session_id: &str) -> Result<Option<Session>, LeagueError>;

    fn list(&self) -> Result<Vec<Session>, LeagueError>;

    /// Read-modify-write one session. If `apply` fails nothing is written
    /// and its error is returned. Missing sessions yield `NotFound`.
    fn update(
        &self,
        session_id: &str,
        apply: &mut dyn FnMut(&mut Session) -> Result<(), LeagueError>,
    ) -> Result<Session, LeagueError>;
}
