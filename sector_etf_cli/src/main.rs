mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "sector-etf")]
#[command(about = "Track daily NAV, AUM and shares outstanding for sector ETFs")]
struct Cli {
    /// Output format: table, json, csv, or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every configured fund page and store today's snapshots
    Run(commands::run::RunArgs),
    /// Extract a snapshot from a saved page without fetching or storing
    Extract(commands::extract::ExtractArgs),
    /// Show stored snapshots
    Show(commands::show::ShowArgs),
    /// List configured tickers and their source pages
    Sources(commands::sources::SourcesArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is not an error.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sector_etf=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);

    match &cli.command {
        Commands::Run(args) => commands::run::run(args).await?,
        Commands::Extract(args) => commands::extract::run(args, &format)?,
        Commands::Show(args) => commands::show::run(args, &format)?,
        Commands::Sources(args) => commands::sources::run(args, &format)?,
    }

    Ok(())
}
