//! Configuration validation and policy construction.
//!
//! Everything read from the INI file is checked here before a session
//! manager or store is built from it.

use crate::domain::error::LeagueError;
use crate::domain::rules::{
    AccessList, LeaguePolicy, TournamentRules, DEFAULT_DECK_SIZE, DEFAULT_DURATION_DAYS,
    DEFAULT_SESSION_TTL_HOURS, DEFAULT_WEIGHT_LIMIT,
};
use crate::ports::config_port::ConfigPort;
use chrono::Duration;
use std::path::PathBuf;

pub fn validate_league_config(config: &dyn ConfigPort) -> Result<(), LeagueError> {
    positive_int(config, "tournament", "deck_size", DEFAULT_DECK_SIZE as i64)?;
    positive_int(config, "tournament", "weight_limit", DEFAULT_WEIGHT_LIMIT as i64)?;
    positive_int(config, "tournament", "duration_days", DEFAULT_DURATION_DAYS as i64)?;
    positive_int(config, "tournament", "session_ttl_hours", DEFAULT_SESSION_TTL_HOURS)?;
    catalog_path(config)?;
    validate_pool_size(config)?;
    Ok(())
}

pub fn build_rules(config: &dyn ConfigPort) -> Result<TournamentRules, LeagueError> {
    let deck_size = positive_int(config, "tournament", "deck_size", DEFAULT_DECK_SIZE as i64)?;
    let weight_limit =
        positive_int(config, "tournament", "weight_limit", DEFAULT_WEIGHT_LIMIT as i64)?;
    let duration_days =
        positive_int(config, "tournament", "duration_days", DEFAULT_DURATION_DAYS as i64)?;

    let mut rules = TournamentRules::new(
        deck_size as usize,
        u32::try_from(weight_limit).map_err(|_| out_of_range("tournament", "weight_limit"))?,
    )?;
    rules.duration_days =
        u32::try_from(duration_days).map_err(|_| out_of_range("tournament", "duration_days"))?;
    Ok(rules)
}

pub fn build_policy(config: &dyn ConfigPort) -> Result<LeaguePolicy, LeagueError> {
    let ttl_hours = positive_int(
        config,
        "tournament",
        "session_ttl_hours",
        DEFAULT_SESSION_TTL_HOURS,
    )?;
    let session_ttl =
        Duration::try_hours(ttl_hours).ok_or_else(|| out_of_range("tournament", "session_ttl_hours"))?;

    Ok(LeaguePolicy {
        rules: build_rules(config)?,
        session_ttl,
        access: access_list(config),
    })
}

/// `[access] whitelist` as a comma separated list. Absent or blank means open.
pub fn access_list(config: &dyn ConfigPort) -> AccessList {
    AccessList::from_wallets(config.get_list("access", "whitelist"))
}

pub fn catalog_path(config: &dyn ConfigPort) -> Result<PathBuf, LeagueError> {
    let path = match config.get_string("catalog", "path") {
        Some(s) if !s.trim().is_empty() => PathBuf::from(s.trim()),
        _ => {
            return Err(LeagueError::ConfigMissing {
                section: "catalog".to_string(),
                key: "path".to_string(),
            })
        }
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("json") => {
            Ok(path)
        }
        _ => Err(LeagueError::ConfigInvalid {
            section: "catalog".to_string(),
            key: "path".to_string(),
            reason: "catalog must be a .csv or .json file".to_string(),
        }),
    }
}

fn validate_pool_size(config: &dyn ConfigPort) -> Result<(), LeagueError> {
    let value = config.get_int("sqlite", "pool_size", 4);
    if value < 1 || u32::try_from(value).is_err() {
        return Err(LeagueError::ConfigInvalid {
            section: "sqlite".to_string(),
            key: "pool_size".to_string(),
            reason: format!("pool_size must be between 1 and {}, got {value}", u32::MAX),
        });
    }
    Ok(())
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, LeagueError> {
    if let Some(raw) = config.get_string(section, key) {
        if raw.trim().parse::<i64>().is_err() {
            return Err(LeagueError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("{key} must be an integer, got {raw:?}"),
            });
        }
    }
    let value = config.get_int(section, key, default);
    if value <= 0 {
        return Err(LeagueError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be positive"),
        });
    }
    Ok(value)
}

fn out_of_range(section: &str, key: &str) -> LeagueError {
    LeagueError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("{key} is out of range"),
    }
}
