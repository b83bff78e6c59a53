//! JSON file adapters: token catalog and simulation engine feed.

use crate::domain::error::LeagueError;
use crate::domain::performance::DayPerformance;
use crate::domain::session::Session;
use crate::domain::token::Token;
use crate::ports::catalog_port::CatalogPort;
use crate::ports::simulation_port::SimulationPort;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Either a bare token array or the provider's `{"tokens": [...]}` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<Token>),
    Wrapped { tokens: Vec<Token> },
}

pub struct JsonCatalogAdapter {
    path: PathBuf,
}

impl JsonCatalogAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn parse(content: &str) -> Result<Vec<Token>, LeagueError> {
        let doc: CatalogDocument =
            serde_json::from_str(content).map_err(|e| LeagueError::Catalog {
                reason: format!("JSON parse error: {e}"),
            })?;
        Ok(match doc {
            CatalogDocument::List(tokens) => tokens,
            CatalogDocument::Wrapped { tokens } => tokens,
        })
    }
}

impl CatalogPort for JsonCatalogAdapter {
    fn fetch_tokens(&self) -> Result<Vec<Token>, LeagueError> {
        let content = fs::read_to_string(&self.path).map_err(|e| LeagueError::Catalog {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        Self::parse(&content)
    }
}

/// Either a bare day array or `{"daily_scores": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeedDocument {
    Days(Vec<DayPerformance>),
    Wrapped { daily_scores: Vec<DayPerformance> },
}

enum FeedSource {
    Directory(PathBuf),
    File(PathBuf),
}

/// Reads engine output from disk: either one file per session
/// (`<dir>/<session_id>.json`) or a single fixed file.
pub struct JsonFeedAdapter {
    source: FeedSource,
}

impl JsonFeedAdapter {
    pub fn from_dir(dir: PathBuf) -> Self {
        Self {
            source: FeedSource::Directory(dir),
        }
    }

    pub fn from_file(path: PathBuf) -> Self {
        Self {
            source: FeedSource::File(path),
        }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        match &self.source {
            FeedSource::Directory(dir) => dir.join(format!("{session_id}.json")),
            FeedSource::File(path) => path.clone(),
        }
    }

    pub fn parse(session_id: &str, content: &str) -> Result<Vec<DayPerformance>, LeagueError> {
        let doc: FeedDocument =
            serde_json::from_str(content).map_err(|e| LeagueError::SimulationFeed {
                session_id: session_id.to_string(),
                reason: format!("JSON parse error: {e}"),
            })?;
        Ok(match doc {
            FeedDocument::Days(days) => days,
            FeedDocument::Wrapped { daily_scores } => daily_scores,
        })
    }

    fn read(session_id: &str, path: &Path) -> Result<String, LeagueError> {
        fs::read_to_string(path).map_err(|e| LeagueError::SimulationFeed {
            session_id: session_id.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })
    }
}

impl SimulationPort for JsonFeedAdapter {
    fn daily_performance(&self, session: &Session) -> Result<Vec<DayPerformance>, LeagueError> {
        let path = self.path_for(&session.session_id);
        let content = Self::read(&session.session_id, &path)?;
        Self::parse(&session.session_id, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const FEED: &str = r#"{
        "daily_scores": [
            {"day": 1, "tokens_performance": [
                {"symbol": "BTC", "name": "Bitcoin", "final_score": 30.0, "mc_factor": 0.85},
                {"symbol": "ETH", "name": "Ethereum", "final_score": 10.0}
            ]},
            {"day": 2, "market_position": 3, "tokens_performance": [
                {"symbol": "BTC", "final_score": 80.0, "activity_rank": 4},
                {"symbol": "ETH", "final_score": 40.0}
            ]}
        ]
    }"#;

    #[test]
    fn parses_wrapped_catalog() {
        let tokens = JsonCatalogAdapter::parse(
            r#"{"tokens": [{"symbol": "BTC", "name": "Bitcoin", "tournament_weight": 50,
                "cmc_rank": 1, "current_price": 65000.0}], "total_count": 1}"#,
        )
        .unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].current_price, Some(65000.0));
    }

    #[test]
    fn parses_bare_catalog() {
        let tokens = JsonCatalogAdapter::parse(
            r#"[{"symbol": "ADA", "name": "Cardano", "tournament_weight": 35}]"#,
        )
        .unwrap();
        assert_eq!(tokens, vec![Token::new("ADA", "Cardano", 35)]);
    }

    #[test]
    fn catalog_missing_weight_is_error() {
        let err = JsonCatalogAdapter::parse(r#"[{"symbol": "ADA", "name": "Cardano"}]"#)
            .unwrap_err();
        assert!(matches!(err, LeagueError::Catalog { .. }));
    }

    #[test]
    fn parses_wrapped_feed() {
        let days = JsonFeedAdapter::parse("s-1", FEED).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].tokens_performance[0].mc_factor, 0.85);
        assert_eq!(days[1].market_position, Some(3));
        assert_eq!(days[1].tokens_performance[0].activity_rank, Some(4));
        assert_eq!(days[1].tokens_performance[1].name, "");
    }

    #[test]
    fn feed_from_single_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", FEED).unwrap();
        let adapter = JsonFeedAdapter::from_file(file.path().to_path_buf());
        let path = adapter.path_for("anything");
        assert_eq!(path, file.path());
        let days = JsonFeedAdapter::parse("anything", &JsonFeedAdapter::read("anything", &path).unwrap()).unwrap();
        assert_eq!(days.len(), 2);
    }

    #[test]
    fn feed_dir_resolves_per_session_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("abc.json"), "[]").unwrap();
        let adapter = JsonFeedAdapter::from_dir(dir.path().to_path_buf());
        assert_eq!(adapter.path_for("abc"), dir.path().join("abc.json"));
        let content = JsonFeedAdapter::read("abc", &adapter.path_for("abc")).unwrap();
        assert!(JsonFeedAdapter::parse("abc", &content).unwrap().is_empty());
    }

    #[test]
    fn missing_feed_file_names_session() {
        let dir = TempDir::new().unwrap();
        let adapter = JsonFeedAdapter::from_dir(dir.path().to_path_buf());
        let err = JsonFeedAdapter::read("xyz", &adapter.path_for("xyz")).unwrap_err();
        assert!(matches!(err, LeagueError::SimulationFeed { session_id, .. } if session_id == "xyz"));
    }
}
