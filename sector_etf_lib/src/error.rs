//! Error types for the library layer.

use std::fmt;

use crate::config::ConfigError;
use crate::db::DbError;

/// Errors produced by the library layer. Extraction itself never fails;
/// these cover the fetch, storage and configuration around it.
#[derive(Debug)]
pub enum SectorEtfError {
    /// The provider page could not be fetched.
    Fetch(sector_etf_fetch::Error),
    /// A snapshot could not be stored or read back.
    Db(DbError),
    /// The sources file is unreadable or invalid.
    Config(ConfigError),
}

impl fmt::Display for SectorEtfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "Fetch error: {}", e),
            Self::Db(e) => write!(f, "Database error: {}", e),
            Self::Config(e) => write!(f, "Config error: {}", e),
        }
    }
}

impl std::error::Error for SectorEtfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Db(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<sector_etf_fetch::Error> for SectorEtfError {
    fn from(e: sector_etf_fetch::Error) -> Self {
        Self::Fetch(e)
    }
}

impl From<DbError> for SectorEtfError {
    fn from(e: DbError) -> Self {
        Self::Db(e)
    }
}

impl From<ConfigError> for SectorEtfError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
