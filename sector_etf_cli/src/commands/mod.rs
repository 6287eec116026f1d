//! CLI subcommand implementations.

pub mod extract;
pub mod run;
pub mod show;
pub mod sources;

use std::path::{Path, PathBuf};

/// Database used when neither `--db` nor `SECTOR_ETF_DB` is set.
pub const DEFAULT_DB_PATH: &str = "sector_etf.db";

/// `--db` wins, then `SECTOR_ETF_DB`, then [`DEFAULT_DB_PATH`].
pub fn resolve_db_path(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    match std::env::var("SECTOR_ETF_DB") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_DB_PATH),
    }
}
