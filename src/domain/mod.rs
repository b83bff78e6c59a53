//! Core domain types and logic.

pub mod config_validation;
pub mod deck;
pub mod error;
pub mod leaderboard;
pub mod league;
pub mod performance;
pub mod rules;
pub mod scoring;
pub mod session;
pub mod token;
