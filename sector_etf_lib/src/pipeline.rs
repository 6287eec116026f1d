//! Fetch-then-extract for a single fund page.

use sector_etf_fetch::PageClient;

use crate::config::EngineConfig;
use crate::error::SectorEtfError;
use crate::snapshot::{build_snapshot, Snapshot};

/// Fetches `url` and extracts a snapshot from it.
///
/// Only the fetch can fail. A page that yields no figures is still a
/// snapshot, with every field `None`.
pub async fn fetch_snapshot(
    client: &PageClient,
    url: &str,
    config: &EngineConfig,
) -> Result<Snapshot, SectorEtfError> {
    let html = client.fetch_html(url).await?;
    tracing::debug!("Fetched {} ({} bytes)", url, html.len());
    let snapshot = build_snapshot(&html, url, config);
    if snapshot.found_count() == 0 {
        tracing::warn!("No figures found on {}", url);
    }
    Ok(snapshot)
}
