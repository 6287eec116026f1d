use anyhow::Result;
use sector_etf_lib::{ResolvedSources, Snapshot, SnapshotRow};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    /// Unknown names fall back to a table.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "csv" => Self::Csv,
            "markdown" | "md" => Self::Markdown,
            _ => Self::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct StoredRow {
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "As Of")]
    #[serde(rename = "As Of")]
    asof_date: String,
    #[tabled(rename = "NAV")]
    #[serde(rename = "NAV")]
    nav: String,
    #[tabled(rename = "AUM")]
    #[serde(rename = "AUM")]
    aum: String,
    #[tabled(rename = "Shares Out")]
    #[serde(rename = "Shares Out")]
    shares_outstanding: String,
    #[tabled(rename = "Updated")]
    #[serde(rename = "Updated")]
    updated_at: String,
}

#[derive(Tabled, Serialize)]
struct FieldRow {
    #[tabled(rename = "Field")]
    #[serde(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
    #[tabled(rename = "Found By")]
    #[serde(rename = "Found By")]
    found_by: String,
}

#[derive(Tabled, Serialize)]
struct SourceRow {
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
    #[tabled(rename = "URL")]
    #[serde(rename = "URL")]
    url: String,
}

/// JSON shape of `sources` output.
#[derive(Serialize)]
pub struct SourceEntry<'a> {
    pub ticker: &'a str,
    pub url: Option<&'a str>,
}

// -- Row builders --

fn build_stored_rows(rows: &[SnapshotRow]) -> Vec<StoredRow> {
    rows.iter()
        .map(|r| StoredRow {
            ticker: r.ticker.clone(),
            asof_date: r.asof_date.to_string(),
            nav: format_price(r.nav),
            aum: format_amount(r.aum),
            shares_outstanding: format_amount(r.shares_outstanding),
            updated_at: r.updated_at.clone(),
        })
        .collect()
}

fn build_field_rows(snapshot: &Snapshot) -> Vec<FieldRow> {
    let diag = &snapshot.diagnostics;
    let label_or_dash = |label: &Option<String>| label.clone().unwrap_or_else(|| "-".to_string());
    vec![
        FieldRow {
            field: "As Of".into(),
            value: snapshot.asof_date.to_string(),
            found_by: diag.asof_source.to_string(),
        },
        FieldRow {
            field: "NAV".into(),
            value: format_price(snapshot.nav),
            found_by: label_or_dash(&diag.nav.label),
        },
        FieldRow {
            field: "AUM".into(),
            value: format_amount(snapshot.aum),
            found_by: label_or_dash(&diag.aum.label),
        },
        FieldRow {
            field: "Shares Out".into(),
            value: format_amount(snapshot.shares_outstanding),
            found_by: label_or_dash(&diag.shares.label),
        },
    ]
}

fn build_source_rows(tickers: &[String], resolved: &ResolvedSources) -> Vec<SourceRow> {
    tickers
        .iter()
        .map(|t| {
            let url = resolved
                .targets
                .iter()
                .find(|target| &target.ticker == t)
                .map(|target| target.url.clone());
            SourceRow {
                ticker: t.clone(),
                status: if url.is_some() { "ok" } else { "missing" }.to_string(),
                url: url.unwrap_or_default(),
            }
        })
        .collect()
}

// -- Dispatch --

fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

pub fn print_stored(rows: &[SnapshotRow], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&rows);
            Ok(())
        }
        _ => print_rows(build_stored_rows(rows), format),
    }
}

pub fn print_snapshot(snapshot: &Snapshot, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(snapshot);
            Ok(())
        }
        _ => print_rows(build_field_rows(snapshot), format),
    }
}

pub fn print_sources(
    tickers: &[String],
    resolved: &ResolvedSources,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let entries: Vec<SourceEntry<'_>> = tickers
                .iter()
                .map(|t| SourceEntry {
                    ticker: t,
                    url: resolved
                        .targets
                        .iter()
                        .find(|target| &target.ticker == t)
                        .map(|target| target.url.as_str()),
                })
                .collect();
            print_json(&entries);
            Ok(())
        }
        _ => print_rows(build_source_rows(tickers, resolved), format),
    }
}

// -- JSON output --

pub fn print_json<T: serde::Serialize + ?Sized>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// Large amounts with a B/M/K suffix, `-` when absent.
pub fn format_amount(value: Option<f64>) -> String {
    let Some(v) = value else {
        return "-".to_string();
    };
    let abs = v.abs();
    if abs >= 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", v / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}K", v / 1e3)
    } else {
        format!("{:.2}", v)
    }
}

fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sector_etf_lib::{build_snapshot_at, EngineConfig, SourceTarget};

    fn sample_snapshot() -> Snapshot {
        let html = "<p>NAV $145.42</p><p>Assets Under Management $93,602.55 M</p>\
                    <p>As of Jan 15, 2026</p>";
        build_snapshot_at(
            html,
            "https://example.com/spy",
            &EngineConfig::default(),
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        )
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("CSV"), OutputFormat::Csv);
        assert_eq!(OutputFormat::parse("md"), OutputFormat::Markdown);
        assert_eq!(OutputFormat::parse("xml"), OutputFormat::Table);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Some(93_602_550_000.0)), "93.60B");
        assert_eq!(format_amount(Some(643_660_000.0)), "643.66M");
        assert_eq!(format_amount(Some(12_500.0)), "12.50K");
        assert_eq!(format_amount(Some(145.42)), "145.42");
        assert_eq!(format_amount(None), "-");
    }

    #[test]
    fn test_field_rows() {
        let rows = build_field_rows(&sample_snapshot());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].value, "2026-01-15");
        assert_eq!(rows[0].found_by, "month_name_date");
        assert_eq!(rows[1].value, "145.42");
        assert_eq!(rows[1].found_by, "NAV");
        assert_eq!(rows[2].value, "93.60B");
        assert_eq!(rows[3].value, "-");
        assert_eq!(rows[3].found_by, "-");
    }

    #[test]
    fn test_source_rows_flag_missing() {
        let tickers = vec!["SPY".to_string(), "GLD".to_string()];
        let resolved = ResolvedSources {
            targets: vec![SourceTarget {
                ticker: "SPY".into(),
                url: "https://example.com/spy".into(),
            }],
            missing: vec!["GLD".into()],
        };
        let rows = build_source_rows(&tickers, &resolved);
        assert_eq!(rows[0].status, "ok");
        assert_eq!(rows[0].url, "https://example.com/spy");
        assert_eq!(rows[1].status, "missing");
        assert_eq!(rows[1].url, "");
    }

    #[test]
    fn test_table_has_headers() {
        let table = Table::new(build_field_rows(&sample_snapshot())).to_string();
        assert!(table.contains("Field"));
        assert!(table.contains("Found By"));
    }

    #[test]
    fn test_csv_rows_serialize() {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for row in build_field_rows(&sample_snapshot()) {
            wtr.serialize(row).unwrap();
        }
        let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        let mut lines = data.lines();
        assert_eq!(lines.next(), Some("Field,Value,Found By"));
        assert_eq!(lines.next(), Some("As Of,2026-01-15,month_name_date"));
    }
}
