//! Daily ingest: fetch every configured fund page, extract, and upsert.
//!
//! Uses the Semaphore + JoinSet + mpsc pattern: fetch tasks run
//! concurrently up to `--concurrency`, and a single receiver loop owns the
//! database and prints one line per ticker. A failing ticker is reported and
//! the run continues.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use sector_etf_lib::{
    fetch_snapshot, load_config, Db, EngineConfig, PageClient, SectorEtfError, Snapshot,
};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::time::sleep;

use super::resolve_db_path;

#[derive(Args)]
pub struct RunArgs {
    /// SQLite database path (default: $SECTOR_ETF_DB or sector_etf.db)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Sources file (YAML or TOML); the built-in list when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only process these tickers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub tickers: Option<Vec<String>>,

    /// Maximum pages fetched at once
    #[arg(long, default_value = "4")]
    pub concurrency: usize,

    /// Fetch and extract without writing to the database
    #[arg(long)]
    pub dry_run: bool,
}

/// Message sent from fetch tasks to the receiver loop.
struct FetchResult {
    ticker: String,
    result: Result<Snapshot, SectorEtfError>,
}

pub async fn run(args: &RunArgs) -> Result<()> {
    if args.concurrency == 0 {
        bail!("--concurrency must be at least 1");
    }

    let config = load_config(args.config.as_deref())?;
    let resolved = config.resolve(args.tickers.as_deref());

    let db = if args.dry_run {
        None
    } else {
        let path = resolve_db_path(args.db.as_deref());
        let db = Db::open(&path)?;
        db.init()?;
        tracing::info!("Writing snapshots to {}", path.display());
        Some(db)
    };

    let client = Arc::new(PageClient::new()?);
    let engine: Arc<EngineConfig> = Arc::new(config.engine.clone());

    let pb = ProgressBar::new(resolved.targets.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?,
    );
    pb.set_message("fetching fund pages...");

    let semaphore = Arc::new(Semaphore::new(args.concurrency));
    let (tx, mut rx) = mpsc::channel::<FetchResult>(args.concurrency * 2);
    let mut join_set = JoinSet::new();

    for target in resolved.targets.iter().cloned() {
        let sem = Arc::clone(&semaphore);
        let sender = tx.clone();
        let client = Arc::clone(&client);
        let engine = Arc::clone(&engine);

        join_set.spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            // Jittered delay so requests do not land on the provider together
            let delay_ms = rand::thread_rng().gen_range(200..600);
            sleep(Duration::from_millis(delay_ms)).await;

            let result = fetch_snapshot(&client, &target.url, &engine).await;
            let _ = sender
                .send(FetchResult {
                    ticker: target.ticker,
                    result,
                })
                .await;
        });
    }
    drop(tx);

    let mut ok = 0usize;
    let mut failed = 0usize;
    let mut stdout = std::io::stdout();

    while let Some(fetch) = rx.recv().await {
        let stored = match fetch.result {
            Ok(snapshot) => match &db {
                Some(db) => db
                    .upsert_snapshot(&fetch.ticker, &snapshot)
                    .map(|_| snapshot)
                    .map_err(SectorEtfError::from),
                None => Ok(snapshot),
            },
            Err(e) => Err(e),
        };
        match stored {
            Ok(snapshot) => {
                ok += 1;
                report(&pb, &mut stdout, &ok_line(&fetch.ticker, &snapshot))?;
            }
            Err(e) => {
                failed += 1;
                tracing::debug!("{} failed: {:?}", fetch.ticker, e);
                report(&pb, &mut stdout, &err_line(&fetch.ticker, &e))?;
            }
        }
        pb.set_message(format!("{} ok, {} err", ok, failed));
        pb.inc(1);
    }

    while let Some(joined) = join_set.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Fetch task panicked: {}", e);
        }
    }

    pb.finish_and_clear();

    if let Some(line) = missing_line(&resolved.missing) {
        println!("{}", line);
    }

    if let Some(db) = &db {
        db.set_meta("last_run_at", &Utc::now().to_rfc3339())?;
    }

    tracing::info!("Run complete: {} ok, {} failed", ok, failed);
    Ok(())
}

/// Writes a report line to `out` with the bar cleared. The line is written
/// whether or not the bar is drawn.
fn report<W: Write>(pb: &ProgressBar, out: &mut W, line: &str) -> std::io::Result<()> {
    pb.suspend(|| writeln!(out, "{}", line))
}

fn ok_line(ticker: &str, snapshot: &Snapshot) -> String {
    format!(
        "[OK] {} asof={} nav={} aum={} shares={}",
        ticker,
        snapshot.asof_date,
        display_value(snapshot.nav),
        display_value(snapshot.aum),
        display_value(snapshot.shares_outstanding)
    )
}

fn err_line(ticker: &str, err: &SectorEtfError) -> String {
    format!("[ERR] {} {}", ticker, err)
}

fn missing_line(missing: &[String]) -> Option<String> {
    if missing.is_empty() {
        None
    } else {
        Some(format!("[WARN] sources missing tickers: {}", missing.join(",")))
    }
}

fn display_value(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}
