//! SQLite storage for fund snapshots.

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::snapshot::Snapshot;

const SCHEMA_VERSION: i32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("date parse error: {0}")]
    Date(#[from] chrono::ParseError),
}

pub struct Db {
    conn: Connection,
}

/// A stored snapshot as read back from `sector_etf_daily`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    pub ticker: String,
    pub asof_date: NaiveDate,
    pub nav: Option<f64>,
    pub aum: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub source_url: String,
    pub raw_payload: serde_json::Value,
    pub updated_at: String,
}

/// Filters for [`Db::query_snapshots`]. Empty filter returns everything,
/// newest first.
#[derive(Debug, Clone, Default)]
pub struct SnapshotFilter {
    pub ticker: Option<String>,
    pub since: Option<NaiveDate>,
    pub limit: Option<i64>,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), DbError> {
        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version < SCHEMA_VERSION {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        self.conn
            .query_row(
                "SELECT value FROM ingest_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO ingest_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Insert or overwrite the row for `(ticker, snapshot.asof_date)`.
    ///
    /// Every column is replaced, including fields that are now `None`: the
    /// latest run for a day is the only record of that day.
    pub fn upsert_snapshot(&self, ticker: &str, snapshot: &Snapshot) -> Result<(), DbError> {
        let payload = serde_json::to_string(&snapshot.diagnostics)?;
        self.conn.execute(
            "INSERT INTO sector_etf_daily
                (ticker, asof_date, nav, aum, shares_outstanding, source_url, raw_payload, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(ticker, asof_date) DO UPDATE SET
                nav = excluded.nav,
                aum = excluded.aum,
                shares_outstanding = excluded.shares_outstanding,
                source_url = excluded.source_url,
                raw_payload = excluded.raw_payload,
                updated_at = excluded.updated_at",
            params![
                ticker,
                snapshot.asof_date.to_string(),
                snapshot.nav,
                snapshot.aum,
                snapshot.shares_outstanding,
                snapshot.source_url,
                payload,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_snapshot(
        &self,
        ticker: &str,
        asof_date: NaiveDate,
    ) -> Result<Option<SnapshotRow>, DbError> {
        let raw = self
            .conn
            .query_row(
                "SELECT ticker, asof_date, nav, aum, shares_outstanding, source_url,
                        raw_payload, updated_at
                 FROM sector_etf_daily
                 WHERE ticker = ?1 AND asof_date = ?2",
                params![ticker, asof_date.to_string()],
                RawRow::from_row,
            )
            .optional()?;
        raw.map(RawRow::into_row).transpose()
    }

    /// Stored rows, newest as-of date first, then by ticker.
    pub fn query_snapshots(&self, filter: &SnapshotFilter) -> Result<Vec<SnapshotRow>, DbError> {
        let mut sql = String::from(
            "SELECT ticker, asof_date, nav, aum, shares_outstanding, source_url,
                    raw_payload, updated_at
             FROM sector_etf_daily
             WHERE 1=1",
        );

        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref ticker) = filter.ticker {
            params_vec.push(Box::new(ticker.to_ascii_uppercase()));
            sql.push_str(&format!(" AND ticker = ?{}", params_vec.len()));
        }
        if let Some(since) = filter.since {
            params_vec.push(Box::new(since.to_string()));
            sql.push_str(&format!(" AND asof_date >= ?{}", params_vec.len()));
        }

        sql.push_str(" ORDER BY asof_date DESC, ticker ASC");

        if let Some(n) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }

        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), RawRow::from_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?.into_row()?);
        }
        Ok(result)
    }

    pub fn snapshot_count(&self) -> Result<i64, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(1) FROM sector_etf_daily", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Column values before date and JSON decoding.
struct RawRow {
    ticker: String,
    asof_date: String,
    nav: Option<f64>,
    aum: Option<f64>,
    shares_outstanding: Option<f64>,
    source_url: String,
    raw_payload: String,
    updated_at: String,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            ticker: row.get(0)?,
            asof_date: row.get(1)?,
            nav: row.get(2)?,
            aum: row.get(3)?,
            shares_outstanding: row.get(4)?,
            source_url: row.get(5)?,
            raw_payload: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_row(self) -> Result<SnapshotRow, DbError> {
        Ok(SnapshotRow {
            ticker: self.ticker,
            asof_date: NaiveDate::parse_from_str(&self.asof_date, "%Y-%m-%d")?,
            nav: self.nav,
            aum: self.aum,
            shares_outstanding: self.shares_outstanding,
            source_url: self.source_url,
            raw_payload: serde_json::from_str(&self.raw_payload)?,
            updated_at: self.updated_at,
        })
    }
}
