//! Stored snapshot listing.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use sector_etf_lib::{Db, SnapshotFilter};

use super::resolve_db_path;
use crate::output::{print_stored, OutputFormat};

#[derive(Args)]
pub struct ShowArgs {
    /// SQLite database path (default: $SECTOR_ETF_DB or sector_etf.db)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Only this ticker
    #[arg(long)]
    pub ticker: Option<String>,

    /// Only as-of dates on or after this day (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<NaiveDate>,

    /// Maximum rows
    #[arg(long)]
    pub limit: Option<i64>,
}

pub fn run(args: &ShowArgs, format: &OutputFormat) -> Result<()> {
    let path = resolve_db_path(args.db.as_deref());
    let db = Db::open(&path)?;
    db.init()?;

    let rows = db.query_snapshots(&SnapshotFilter {
        ticker: args.ticker.clone(),
        since: args.since,
        limit: args.limit,
    })?;

    if rows.is_empty() {
        eprintln!("No snapshots stored in {}", path.display());
    }
    if let Some(last_run) = db.get_meta("last_run_at")? {
        eprintln!("Last run: {}", last_run);
    }
    print_stored(&rows, format)
}
