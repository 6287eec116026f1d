//! Snapshot assembly: one immutable record per fetched page.

use chrono::{NaiveDate, Utc};
use scraper::Html;
use serde::Serialize;

use crate::asof::{resolve_asof_date_at, DateSource};
use crate::config::EngineConfig;
use crate::locator::locate;
use crate::structured::augment_document;
use crate::text::document_text;

/// How one field was (or was not) found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiagnostic {
    /// Label phrase that won the search, if any occurred.
    pub label: Option<String>,
    /// Amount read from the label's window before acceptance checks.
    pub raw_value: Option<f64>,
    /// Whether `raw_value` made it into the snapshot.
    pub accepted: bool,
}

/// Audit trail for a snapshot. Stored verbatim, never read back by the
/// engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub nav: FieldDiagnostic,
    pub aum: FieldDiagnostic,
    pub shares: FieldDiagnostic,
    pub asof_source: DateSource,
    /// The as-of date is the processing date, not one read from the page.
    pub asof_fallback: bool,
    pub structured_present: bool,
    pub url: String,
}

impl Diagnostics {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Figures read from one fund page.
///
/// `None` means the value was not found on the page, never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub asof_date: NaiveDate,
    pub nav: Option<f64>,
    pub aum: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub source_url: String,
    pub diagnostics: Diagnostics,
}

impl Snapshot {
    /// Number of the three figures that were found.
    pub fn found_count(&self) -> usize {
        [self.nav, self.aum, self.shares_outstanding]
            .iter()
            .filter(|v| v.is_some())
            .count()
    }
}

/// Builds a snapshot from a page, assuming today's UTC date when the page
/// carries no as-of date.
pub fn build_snapshot(html: &str, source_url: &str, config: &EngineConfig) -> Snapshot {
    build_snapshot_at(html, source_url, config, Utc::now().date_naive())
}

/// Builds a snapshot from a page with an explicit fallback date.
///
/// Missing fields come back as `None`; nothing here fails. The as-of date is
/// read from the visible text only, while field values are searched in the
/// text widened by the hydration payload.
pub fn build_snapshot_at(
    html: &str,
    source_url: &str,
    config: &EngineConfig,
    today: NaiveDate,
) -> Snapshot {
    let document = Html::parse_document(html);
    let plain = document_text(&document);
    let (search_text, structured_present) =
        augment_document(&document, &plain, &config.hydration_script_id);

    let asof = resolve_asof_date_at(&plain, &config.date_patterns, today);

    let (nav, nav_diag) = extract_field(&search_text, &config.labels.nav, config);
    let (aum, aum_diag) = extract_field(&search_text, &config.labels.aum, config);
    let (shares_outstanding, shares_diag) =
        extract_field(&search_text, &config.labels.shares_outstanding, config);

    tracing::debug!(
        "Snapshot for {}: asof={} ({}) nav={:?} aum={:?} shares={:?} structured={}",
        source_url,
        asof.date,
        asof.source,
        nav,
        aum,
        shares_outstanding,
        structured_present
    );

    Snapshot {
        asof_date: asof.date,
        nav,
        aum,
        shares_outstanding,
        source_url: source_url.to_string(),
        diagnostics: Diagnostics {
            nav: nav_diag,
            aum: aum_diag,
            shares: shares_diag,
            asof_source: asof.source,
            asof_fallback: asof.source.is_fallback(),
            structured_present,
            url: source_url.to_string(),
        },
    }
}

/// Runs the label search for one field. Negative amounts (a "change" column
/// picked up by mistake) are kept in diagnostics but not accepted.
fn extract_field(
    text: &str,
    labels: &[String],
    config: &EngineConfig,
) -> (Option<f64>, FieldDiagnostic) {
    let hit = locate(
        text,
        labels,
        config.window_chars,
        config.label_fallback,
        config.label_match,
    );
    let raw_value = hit.as_ref().and_then(|h| h.value);
    let value = raw_value.filter(|v| *v >= 0.0);
    let diag = FieldDiagnostic {
        label: hit.map(|h| h.label),
        raw_value,
        accepted: value.is_some(),
    };
    (value, diag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asof::DatePattern;
    use crate::locator::{LabelFallback, LabelMatch};

    const FULL_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head><title>State Street SPDR S&amp;P 500 ETF Trust</title></head>
  <body>
    <section class="fund-overview">
      <h2>Key Features</h2>
      <div class="row"><span>NAV</span> <span>$145.42</span></div>
      <div class="row"><span>Assets Under Management</span><span>$93,602.55 M</span></div>
      <div class="row"><span>Shares Outstanding</span>
        <span>643.66 M</span></div>
      <p class="date">As of Jan 15, 2026</p>
    </section>
  </body>
</html>"#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 6, 1).unwrap()
    }

    fn build(html: &str) -> Snapshot {
        build_snapshot_at(html, "https://example.com/spy", &EngineConfig::default(), today())
    }

    #[test]
    fn test_full_page() {
        let snap = build(FULL_PAGE);
        assert_eq!(snap.asof_date, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert_eq!(snap.nav, Some(145.42));
        assert_eq!(snap.aum, Some(93_602_550_000.0));
        assert_eq!(snap.shares_outstanding, Some(643_660_000.0));
        assert_eq!(snap.source_url, "https://example.com/spy");
        assert_eq!(snap.found_count(), 3);

        let diag = &snap.diagnostics;
        assert_eq!(diag.nav.label.as_deref(), Some("NAV"));
        assert_eq!(diag.aum.label.as_deref(), Some("Assets Under Management"));
        assert_eq!(diag.asof_source, DateSource::Page(DatePattern::MonthNameDate));
        assert!(!diag.asof_fallback);
        assert!(!diag.structured_present);
    }

    #[test]
    fn test_only_nav_present() {
        let html = "<html><body><p>NAV</p><p>$145.42</p><p>As of 01/15/2026</p></body></html>";
        let snap = build(html);
        assert_eq!(snap.nav, Some(145.42));
        assert_eq!(snap.aum, None);
        assert_eq!(snap.shares_outstanding, None);
        assert_eq!(snap.asof_date, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert_eq!(snap.diagnostics.aum.label, None);
        assert!(!snap.diagnostics.aum.accepted);
    }

    #[test]
    fn test_empty_page_falls_back() {
        let snap = build("");
        assert_eq!(snap.found_count(), 0);
        assert_eq!(snap.asof_date, today());
        assert!(snap.diagnostics.asof_fallback);
        assert_eq!(snap.diagnostics.asof_source, DateSource::Fallback);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let first = build(FULL_PAGE);
        let second = build(FULL_PAGE);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_values_only_in_hydration_payload() {
        let html = r#"<html><body>
            <p>Fund Net Asset Value as of Jan 14 2026</p>
            <script id="__NEXT_DATA__" type="application/json">
              {"props":{"pageProps":{"fund":{"sharesOutstanding":"1,234.5 M","totalNetAssets":"$12.3 B"}}}}
            </script>
            </body></html>"#;
        let snap = build(html);
        assert!(snap.diagnostics.structured_present);
        assert_eq!(snap.shares_outstanding, Some(1_234_500_000.0));
        assert_eq!(snap.aum, Some(12.3e9));
        // "Net Assets" outranks "Total Net Assets" and occurs inside it.
        assert_eq!(snap.diagnostics.aum.label.as_deref(), Some("Net Assets"));
        assert_eq!(snap.asof_date, NaiveDate::from_ymd_opt(2026, 1, 14).unwrap());
    }

    #[test]
    fn test_hydration_payload_is_not_a_date_source() {
        let html = r#"<p>NAV $1.00</p>
            <script id="__NEXT_DATA__">{"label":"As of Jan 15, 2026"}</script>"#;
        let snap = build(html);
        assert!(snap.diagnostics.structured_present);
        assert_eq!(snap.asof_date, today());
        assert!(snap.diagnostics.asof_fallback);
    }

    #[test]
    fn test_nav_caption_date_is_not_the_nav() {
        let html = "<p>Fund Net Asset Value as of Jan 15 2026</p><p>$145.42</p>";
        let snap = build(html);
        assert_eq!(snap.nav, Some(145.42));
        assert_eq!(snap.diagnostics.nav.label.as_deref(), Some("Net Asset Value"));
        assert_eq!(snap.asof_date, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
    }

    #[test]
    fn test_whole_word_labels_skip_menu_text() {
        let html = "<p>Skip navigation</p><p>S&amp;P 500</p><p>NAV $590.12</p>";
        assert_eq!(build(html).nav, Some(500.0));

        let mut config = EngineConfig::default();
        config.label_match = LabelMatch::WholeWord;
        let snap = build_snapshot_at(html, "https://example.com/x", &config, today());
        assert_eq!(snap.nav, Some(590.12));
    }

    #[test]
    fn test_negative_value_is_not_accepted() {
        let html = "<p>NAV Change -0.52</p>";
        let snap = build(html);
        assert_eq!(snap.nav, None);
        assert_eq!(snap.diagnostics.nav.raw_value, Some(-0.52));
        assert!(!snap.diagnostics.nav.accepted);
    }

    #[test]
    fn test_custom_engine_config() {
        let mut config = EngineConfig::default();
        config.labels.nav = vec!["Closing Price".into(), "NAV".into()];
        config.label_fallback = LabelFallback::NextLabel;
        config.window_chars = 15;
        let html = "<p>Closing Price n/a</p><p>NAV $20.10</p>";
        let snap = build_snapshot_at(html, "https://example.com/x", &config, today());
        assert_eq!(snap.nav, Some(20.10));
        assert_eq!(snap.diagnostics.nav.label.as_deref(), Some("NAV"));
    }

    #[test]
    fn test_diagnostics_json_shape() {
        let snap = build(FULL_PAGE);
        let json = snap.diagnostics.to_json();
        assert_eq!(json["asof_source"], "month_name_date");
        assert_eq!(json["asof_fallback"], false);
        assert_eq!(json["structured_present"], false);
        assert_eq!(json["nav"]["label"], "NAV");
        assert_eq!(json["nav"]["raw_value"], 145.42);
        assert_eq!(json["url"], "https://example.com/spy");
    }
}
