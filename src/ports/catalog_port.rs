//! Token catalog provider port.

use crate::domain::error::LeagueError;
use crate::domain::token::{Token, TokenCatalog};

pub trait CatalogPort {
    fn fetch_tokens(&self) -> Result<Vec<Token>, LeagueError>;

    /// Fetch and index the tokens.
    fn load_catalog(&self) -> Result<TokenCatalog, LeagueError> {
        TokenCatalog::new(self.fetch_tokens()?)
    }
}
