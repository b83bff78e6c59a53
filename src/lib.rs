//! tokenleague: fantasy token tournament backend.
//!
//! Players build a deck of tokens under a weight budget, lock it into a
//! session, and receive a score once an external engine has simulated the
//! tournament. Hexagonal architecture: domain logic in [`domain`], port
//! traits in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
