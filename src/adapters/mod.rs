//! Concrete adapter implementations for ports.

pub mod csv_catalog_adapter;
pub mod file_config_adapter;
pub mod json_adapter;
pub mod memory_store;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
#[cfg(feature = "web")]
pub mod web;

use crate::domain::error::LeagueError;
use crate::domain::token::TokenCatalog;
use crate::ports::catalog_port::CatalogPort;
use std::path::Path;

/// Pick the catalog reader from the file extension.
pub fn catalog_adapter(path: &Path) -> Result<Box<dyn CatalogPort>, LeagueError> {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("csv") => Ok(Box::new(csv_catalog_adapter::CsvCatalogAdapter::new(path.to_path_buf()))),
        Some("json") => Ok(Box::new(json_adapter::JsonCatalogAdapter::new(path.to_path_buf()))),
        _ => Err(LeagueError::Catalog {
            reason: format!("unsupported catalog format: {}", path.display()),
        }),
    }
}

pub fn load_catalog(path: &Path) -> Result<TokenCatalog, LeagueError> {
    catalog_adapter(path)?.load_catalog()
}
