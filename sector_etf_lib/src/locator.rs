//! Label-proximity value lookup.
//!
//! Finds a known phrase such as "Shares Outstanding" in flattened page text
//! and reads the first amount inside a bounded window after it. Label and
//! value need not be adjacent: text flattening leaves arbitrary whitespace and
//! punctuation between them.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::amount::find_amount;

/// Characters scanned after a label's start offset.
pub const DEFAULT_WINDOW_CHARS: usize = 500;

/// What to do when the winning label's window holds no amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelFallback {
    /// Report the field as missing.
    #[default]
    None,
    /// Try the next candidate label that occurs in the text.
    NextLabel,
}

/// How a label phrase must sit in the text to count as found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMatch {
    /// Anywhere, case-insensitively. `NAV` also hits `Skip navigation`.
    #[default]
    Substring,
    /// Only between word boundaries.
    WholeWord,
}

/// The label that won the search and what its window yielded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelHit {
    pub label: String,
    /// Byte offset of the match in the searched text.
    pub offset: usize,
    pub value: Option<f64>,
}

/// Finds the value for the first candidate label present in `text`, scanning
/// the default window with no fall-through.
pub fn find_value_near_label<S: AsRef<str>>(text: &str, labels: &[S]) -> Option<f64> {
    locate(
        text,
        labels,
        DEFAULT_WINDOW_CHARS,
        LabelFallback::None,
        LabelMatch::Substring,
    )
    .and_then(|hit| hit.value)
}

/// Searches `labels` in order and returns the first one found in `text`
/// together with the amount parsed from its window.
///
/// Candidate order is priority order: the first phrase that occurs anywhere
/// in the text wins, wherever it sits. With [`LabelFallback::NextLabel`] a
/// window without an amount moves on to the next candidate; the first hit is
/// still returned (with `value: None`) when no candidate yields one.
pub fn locate<S: AsRef<str>>(
    text: &str,
    labels: &[S],
    window_chars: usize,
    fallback: LabelFallback,
    matching: LabelMatch,
) -> Option<LabelHit> {
    let mut first_hit: Option<LabelHit> = None;

    for label in labels {
        let label = label.as_ref().trim();
        if label.is_empty() {
            continue;
        }
        let Some((start, end)) = find_label(text, label, matching) else {
            continue;
        };

        let window = label_window(text, start, end, window_chars);
        let hit = LabelHit {
            label: label.to_string(),
            offset: start,
            value: find_amount(window),
        };
        tracing::debug!(
            "Label {:?} at offset {} -> {:?}",
            hit.label,
            hit.offset,
            hit.value
        );

        if hit.value.is_some() || fallback == LabelFallback::None {
            return Some(hit);
        }
        first_hit.get_or_insert(hit);
    }

    first_hit
}

/// Case-insensitive position of `label` in `text` as byte offsets.
fn find_label(text: &str, label: &str, matching: LabelMatch) -> Option<(usize, usize)> {
    let escaped = regex::escape(label);
    let pattern = match matching {
        LabelMatch::Substring => escaped,
        LabelMatch::WholeWord => format!(r"\b{}\b", escaped),
    };
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()?;
    re.find(text).map(|m| (m.start(), m.end()))
}

/// Text after the label, limited to `window_chars` characters counted from
/// the label's start.
fn label_window(text: &str, start: usize, label_end: usize, window_chars: usize) -> &str {
    let rest = &text[start..];
    let window_end = rest
        .char_indices()
        .nth(window_chars)
        .map(|(i, _)| start + i)
        .unwrap_or(text.len());
    if window_end <= label_end {
        return "";
    }
    &text[label_end..window_end]
}
