//! Port traits: the seams between the domain and its collaborators.

pub mod catalog_port;
pub mod config_port;
pub mod score_port;
pub mod session_port;
pub mod simulation_port;
