//! Library layer for the sector ETF tracker: snapshot extraction, sources
//! configuration, and SQLite storage.
//!
//! Extraction turns one fund page into a [`Snapshot`] (NAV, AUM, shares
//! outstanding, as-of date) by searching near known labels. It never fails;
//! missing figures are `None`. Fetching is delegated to the `sector_etf_fetch`
//! crate.

pub mod amount;
pub mod asof;
pub mod config;
pub mod db;
pub mod error;
pub mod locator;
pub mod pipeline;
pub mod snapshot;
pub mod structured;
pub mod text;

pub use sector_etf_fetch;
pub use sector_etf_fetch::{FetchOptions, PageClient};

pub use amount::{find_amount, parse_amount};
pub use asof::{resolve_asof_date, DatePattern, DateSource, ResolvedDate};
pub use config::{
    load_config, ConfigError, EngineConfig, FieldLabels, ResolvedSources, SourceConfig,
    SourceTarget,
};
pub use db::{Db, DbError, SnapshotFilter, SnapshotRow};
pub use error::SectorEtfError;
pub use locator::{find_value_near_label, LabelFallback, LabelMatch};
pub use pipeline::fetch_snapshot;
pub use snapshot::{build_snapshot, build_snapshot_at, Diagnostics, FieldDiagnostic, Snapshot};
pub use structured::augment;
