//! Offline extraction from a saved page.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sector_etf_lib::{build_snapshot, load_config};

use crate::output::{print_snapshot, OutputFormat};

#[derive(Args)]
pub struct ExtractArgs {
    /// Saved HTML page to read
    #[arg(long)]
    pub file: PathBuf,

    /// URL recorded as the snapshot source (default: the file path)
    #[arg(long)]
    pub url: Option<String>,

    /// Sources file whose engine settings are used
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &ExtractArgs, format: &OutputFormat) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let html = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let source = args
        .url
        .clone()
        .unwrap_or_else(|| args.file.display().to_string());

    let snapshot = build_snapshot(&html, &source, &config.engine);
    if snapshot.found_count() == 0 {
        eprintln!("No figures found in {}", args.file.display());
    }
    print_snapshot(&snapshot, format)
}
