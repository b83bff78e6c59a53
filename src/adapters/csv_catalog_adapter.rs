//! CSV token catalog adapter.
//!
//! Expects a header row with `symbol,name,tournament_weight` and optionally
//! `current_price,market_cap`; blank optional cells read as absent.

use crate::domain::error::LeagueError;
use crate::domain::token::Token;
use crate::ports::catalog_port::CatalogPort;
use std::fs;
use std::path::PathBuf;

pub struct CsvCatalogAdapter {
    path: PathBuf,
}

impl CsvCatalogAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn parse(content: &str) -> Result<Vec<Token>, LeagueError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut tokens = Vec::new();
        for (line, result) in rdr.deserialize::<Token>().enumerate() {
            let token = result.map_err(|e| LeagueError::Catalog {
                reason: format!("CSV parse error on record {}: {}", line + 1, e),
            })?;
            tokens.push(token);
        }
        Ok(tokens)
    }
}

impl CatalogPort for CsvCatalogAdapter {
    fn fetch_tokens(&self) -> Result<Vec<Token>, LeagueError> {
        let content = fs::read_to_string(&self.path).map_err(|e| LeagueError::Catalog {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        Self::parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CATALOG: &str = "\
symbol,name,tournament_weight,current_price,market_cap
BTC,Bitcoin,50,65000.5,1280000000000
eth,Ethereum,45,,
DOGE,Dogecoin,28,0.12,
";

    #[test]
    fn parses_rows_with_optional_columns() {
        let tokens = CsvCatalogAdapter::parse(CATALOG).unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].symbol, "BTC");
        assert_eq!(tokens[0].current_price, Some(65000.5));
        assert_eq!(tokens[0].market_cap, Some(1.28e12));
        assert_eq!(tokens[1].current_price, None);
        assert_eq!(tokens[2].tournament_weight, 28);
    }

    #[test]
    fn minimal_columns() {
        let tokens = CsvCatalogAdapter::parse("symbol,name,tournament_weight\nSOL,Solana,38\n").unwrap();
        assert_eq!(tokens, vec![Token::new("SOL", "Solana", 38)]);
    }

    #[test]
    fn bad_weight_is_catalog_error() {
        let err = CsvCatalogAdapter::parse("symbol,name,tournament_weight\nSOL,Solana,heavy\n")
            .unwrap_err();
        assert!(matches!(err, LeagueError::Catalog { reason } if reason.contains("record 1")));
    }

    #[test]
    fn load_catalog_from_file_normalises_symbols() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", CATALOG).unwrap();
        let adapter = CsvCatalogAdapter::new(file.path().to_path_buf());
        let catalog = adapter.load_catalog().unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.weight_of("ETH"), Some(45));
    }

    #[test]
    fn missing_file_is_catalog_error() {
        let adapter = CsvCatalogAdapter::new(PathBuf::from("/nonexistent/tokens.csv"));
        assert!(matches!(
            adapter.fetch_tokens(),
            Err(LeagueError::Catalog { .. })
        ));
    }
}
