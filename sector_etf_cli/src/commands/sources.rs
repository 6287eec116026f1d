use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use sector_etf_lib::load_config;

use crate::output::{print_sources, OutputFormat};

#[derive(Args)]
pub struct SourcesArgs {
    /// Sources file to inspect; the built-in list when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &SourcesArgs, format: &OutputFormat) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let resolved = config.resolve(None);
    print_sources(&config.tickers, &resolved, format)?;
    if !resolved.missing.is_empty() {
        eprintln!(
            "{} of {} tickers have no source page",
            resolved.missing.len(),
            config.tickers.len()
        );
    }
    Ok(())
}
