//! Compact amount parsing: `$93,602.55 M`, `643.66 M`, `145.42`, `1.2B`.

use std::sync::OnceLock;

use regex::Regex;

/// Optional sign glued to an optional currency symbol or the digits, digits
/// with `,` separators and an optional fraction, then an optional K/M/B unit
/// that must end a word (so `145.42 Market` carries no unit).
const AMOUNT_PATTERN: &str =
    r"(?i)(?P<sign>[-+])?(?:(?P<currency>[$€£])\s*)?(?P<num>\d[\d,]*(?:\.\d+)?)(?:\s*(?P<unit>[kmb])\b)?";

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(AMOUNT_PATTERN).expect("amount pattern compiles"))
}

/// Calendar dates whose digits must not be read as amounts: `Jan 15 2026`,
/// `January 15, 2026`, `01/15/2026`.
const DATE_TOKEN_PATTERN: &str = r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}\b|\b\d{1,2}/\d{1,2}/\d{4}\b";

fn date_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATE_TOKEN_PATTERN).expect("date token pattern compiles"))
}

/// Multiplier for a unit suffix letter. Unknown letters scale by one.
pub fn unit_multiplier(unit: char) -> f64 {
    match unit.to_ascii_uppercase() {
        'K' => 1e3,
        'M' => 1e6,
        'B' => 1e9,
        _ => 1.0,
    }
}

/// Parses the first amount found in `text`.
///
/// Returns `None` when no number is present or the digits do not convert to
/// a finite `f64`. Missing data is the common case here, not an error.
pub fn parse_amount(text: &str) -> Option<f64> {
    amount_re().captures(text).and_then(|caps| amount_value(&caps))
}

/// Like [`parse_amount`], but numbers that are part of a calendar date are
/// skipped, so `as of Jan 15 2026 $145.42` yields `145.42`.
pub fn find_amount(text: &str) -> Option<f64> {
    let dates: Vec<(usize, usize)> = date_token_re()
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();
    amount_re()
        .captures_iter(text)
        .filter(|caps| {
            caps.get(0).is_some_and(|m| {
                !dates
                    .iter()
                    .any(|&(start, end)| m.start() < end && start < m.end())
            })
        })
        .find_map(|caps| amount_value(&caps))
}

fn amount_value(caps: &regex::Captures<'_>) -> Option<f64> {
    let digits = caps.name("num")?.as_str().replace(',', "");
    let magnitude: f64 = digits.parse().ok()?;
    let mult = caps
        .name("unit")
        .and_then(|m| m.as_str().chars().next())
        .map(unit_multiplier)
        .unwrap_or(1.0);
    let sign = match caps.name("sign").map(|m| m.as_str()) {
        Some("-") => -1.0,
        _ => 1.0,
    };
    let value = sign * magnitude * mult;
    value.is_finite().then_some(value)
}
