//! As-of date resolution.

use std::fmt;
use std::sync::OnceLock;

use chrono::{NaiveDate, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize, Serializer};

use crate::text::collapse_whitespace;

/// The date phrasings recognized on fund pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePattern {
    /// `Fund Net Asset Value as of Jan 15 2026`
    FundNavPhrase,
    /// `As of Jan 15, 2026`, `As of January 15 2026`
    MonthNameDate,
    /// `As of 01/15/2026`
    NumericDate,
}

/// Default priority: most specific phrasing first.
pub const DEFAULT_DATE_PATTERNS: &[DatePattern] = &[
    DatePattern::FundNavPhrase,
    DatePattern::MonthNameDate,
    DatePattern::NumericDate,
];

/// Where a resolved date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Page(DatePattern),
    /// Nothing on the page matched; the processing date was assumed.
    Fallback,
}

impl DateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page(DatePattern::FundNavPhrase) => "fund_nav_phrase",
            Self::Page(DatePattern::MonthNameDate) => "month_name_date",
            Self::Page(DatePattern::NumericDate) => "numeric_date",
            Self::Fallback => "fallback",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

impl Serialize for DateSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub source: DateSource,
}

impl DatePattern {
    fn regex(self) -> &'static Regex {
        static FUND_NAV: OnceLock<Regex> = OnceLock::new();
        static MONTH_NAME: OnceLock<Regex> = OnceLock::new();
        static NUMERIC: OnceLock<Regex> = OnceLock::new();
        match self {
            Self::FundNavPhrase => FUND_NAV.get_or_init(|| {
                Regex::new(r"(?i)Fund Net Asset Value as of (?P<mon>[a-z]{3}) (?P<day>\d{1,2}),? (?P<year>\d{4})\b")
                    .expect("fund nav date pattern compiles")
            }),
            Self::MonthNameDate => MONTH_NAME.get_or_init(|| {
                Regex::new(r"(?i)\bAs of (?P<mon>[a-z]{3,9})\.? (?P<day>\d{1,2}),? (?P<year>\d{4})\b")
                    .expect("month name date pattern compiles")
            }),
            Self::NumericDate => NUMERIC.get_or_init(|| {
                Regex::new(r"(?i)\bAs of (?P<month>\d{1,2})/(?P<day>\d{1,2})/(?P<year>\d{4})\b")
                    .expect("numeric date pattern compiles")
            }),
        }
    }

    /// Turns one match into a calendar date; implausible dates yield `None`.
    fn parse(self, caps: &Captures<'_>) -> Option<NaiveDate> {
        match self {
            Self::FundNavPhrase => parse_month_name(caps, &["%b %d %Y"]),
            Self::MonthNameDate => parse_month_name(caps, &["%b %d %Y", "%B %d %Y"]),
            Self::NumericDate => {
                let month = caps.name("month")?.as_str().parse().ok()?;
                let day = caps.name("day")?.as_str().parse().ok()?;
                let year = caps.name("year")?.as_str().parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, day)
            }
        }
    }
}

fn parse_month_name(caps: &Captures<'_>, formats: &[&str]) -> Option<NaiveDate> {
    let raw = format!(
        "{} {} {}",
        caps.name("mon")?.as_str(),
        caps.name("day")?.as_str(),
        caps.name("year")?.as_str()
    );
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&raw, fmt).ok())
}

/// Resolves the as-of date with the default pattern priority, falling back
/// to today's UTC date.
pub fn resolve_asof_date(text: &str) -> ResolvedDate {
    resolve_asof_date_at(text, DEFAULT_DATE_PATTERNS, Utc::now().date_naive())
}

/// Resolves the as-of date, using `today` when nothing on the page parses.
pub fn resolve_asof_date_at(text: &str, patterns: &[DatePattern], today: NaiveDate) -> ResolvedDate {
    match find_asof_date(text, patterns) {
        Some((date, pattern)) => ResolvedDate {
            date,
            source: DateSource::Page(pattern),
        },
        None => {
            tracing::debug!("No as-of date found, assuming {}", today);
            ResolvedDate {
                date: today,
                source: DateSource::Fallback,
            }
        }
    }
}

/// Tries `patterns` in order over the whitespace-collapsed text. Within a
/// pattern, the first occurrence that is a real calendar date wins; a match
/// like `As of 13/45/2026` is skipped rather than reported.
pub fn find_asof_date(text: &str, patterns: &[DatePattern]) -> Option<(NaiveDate, DatePattern)> {
    let text = collapse_whitespace(text);
    patterns.iter().find_map(|&pattern| {
        pattern
            .regex()
            .captures_iter(&text)
            .find_map(|caps| pattern.parse(&caps))
            .map(|date| (date, pattern))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        ymd(2030, 6, 1)
    }

    fn resolve(text: &str) -> ResolvedDate {
        resolve_asof_date_at(text, DEFAULT_DATE_PATTERNS, today())
    }

    #[test]
    fn test_fund_nav_phrase() {
        let resolved = resolve_asof_date("Fund Net Asset Value as of Jan 15 2026 $145.42");
        assert_eq!(resolved.date, ymd(2026, 1, 15));
        assert_eq!(resolved.source, DateSource::Page(DatePattern::FundNavPhrase));
    }

    #[test]
    fn test_fallback_is_today_and_flagged() {
        let before = Utc::now().date_naive();
        let resolved = resolve_asof_date("random text with no date");
        let after = Utc::now().date_naive();
        assert!(resolved.date == before || resolved.date == after);
        assert!(resolved.source.is_fallback());
        assert_eq!(resolved.source.as_str(), "fallback");
    }

    #[test]
    fn test_month_name_with_and_without_comma() {
        assert_eq!(resolve("As of Jan 15, 2026").date, ymd(2026, 1, 15));
        assert_eq!(resolve("as of Jan 15 2026").date, ymd(2026, 1, 15));
        assert_eq!(resolve("As of September 3, 2025").date, ymd(2025, 9, 3));
        assert_eq!(resolve("AS OF DEC 31 2025").date, ymd(2025, 12, 31));
    }

    #[test]
    fn test_numeric_date() {
        let resolved = resolve("Holdings As of 01/15/2026");
        assert_eq!(resolved.date, ymd(2026, 1, 15));
        assert_eq!(resolved.source, DateSource::Page(DatePattern::NumericDate));
    }

    #[test]
    fn test_irregular_whitespace_is_collapsed() {
        let resolved = resolve("Fund Net Asset Value\n  as of\tJan \r\n 15   2026");
        assert_eq!(resolved.date, ymd(2026, 1, 15));
        assert_eq!(resolved.source, DateSource::Page(DatePattern::FundNavPhrase));
    }

    #[test]
    fn test_pattern_priority_beats_text_position() {
        let text = "Holdings As of 02/01/2026 ... Performance As of Jan 15, 2026 ... \
                    Fund Net Asset Value as of Jan 14 2026";
        let resolved = resolve(text);
        assert_eq!(resolved.date, ymd(2026, 1, 14));
        assert_eq!(resolved.source, DateSource::Page(DatePattern::FundNavPhrase));

        let without_fund = "Holdings As of 02/01/2026 ... Performance As of Jan 15, 2026";
        assert_eq!(resolve(without_fund).date, ymd(2026, 1, 15));
    }

    #[test]
    fn test_implausible_dates_fall_through() {
        let resolved = resolve("As of Feb 30, 2026 ... As of 01/20/2026");
        assert_eq!(resolved.date, ymd(2026, 1, 20));
        assert_eq!(resolved.source, DateSource::Page(DatePattern::NumericDate));

        let resolved = resolve("As of 13/45/2026");
        assert_eq!(resolved.date, today());
        assert_eq!(resolved.source, DateSource::Fallback);
    }

    #[test]
    fn test_later_occurrence_of_same_pattern() {
        let resolved = resolve("As of Foo 12, 2026 and As of Mar 3, 2026");
        assert_eq!(resolved.date, ymd(2026, 3, 3));
    }

    #[test]
    fn test_fund_phrase_requires_short_month() {
        let resolved = resolve_asof_date_at(
            "Fund Net Asset Value as of January 15 2026",
            &[DatePattern::FundNavPhrase],
            today(),
        );
        assert_eq!(resolved.source, DateSource::Fallback);
    }

    #[test]
    fn test_custom_priority() {
        let text = "As of Jan 15, 2026 ... As of 02/01/2026";
        let resolved = resolve_asof_date_at(
            text,
            &[DatePattern::NumericDate, DatePattern::MonthNameDate],
            today(),
        );
        assert_eq!(resolved.date, ymd(2026, 2, 1));
        assert!(resolve_asof_date_at(text, &[], today()).source.is_fallback());
    }

    #[test]
    fn test_date_source_display() {
        assert_eq!(
            DateSource::Page(DatePattern::MonthNameDate).to_string(),
            "month_name_date"
        );
    }
}
