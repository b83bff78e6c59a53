//! Simulation engine port.

use crate::domain::error::LeagueError;
use crate::domain::performance::DayPerformance;
use crate::domain::session::Session;

/// Source of the engine's per-day token performance for a locked session.
pub trait SimulationPort {
    fn daily_performance(&self, session: &Session) -> Result<Vec<DayPerformance>, LeagueError>;
}
