//! Hydration blob augmentation.
//!
//! Some provider pages ship their data twice: once as rendered text and once
//! as a JSON payload injected by the page framework. Values that only exist in
//! the payload become reachable for the label search once the payload is
//! flattened into text and appended to the page text.

use scraper::{Html, Selector};
use serde_json::Value;

use crate::text::document_text;

/// `id` of the script element carrying the hydration payload.
pub const DEFAULT_HYDRATION_SCRIPT_ID: &str = "__NEXT_DATA__";

/// Parses `html` and returns the visible text widened with the flattened
/// hydration payload, plus whether a valid payload was found.
pub fn augment(html: &str) -> (String, bool) {
    let document = Html::parse_document(html);
    let plain = document_text(&document);
    augment_document(&document, &plain, DEFAULT_HYDRATION_SCRIPT_ID)
}

/// Appends the flattened payload of `script_id` to `plain`.
///
/// A missing, empty, or invalid payload leaves the text unchanged and reports
/// `false`.
pub fn augment_document(document: &Html, plain: &str, script_id: &str) -> (String, bool) {
    match extract_hydration_json(document, script_id) {
        Some(payload) => {
            let flat = flatten_json(&payload);
            let mut text = String::with_capacity(plain.len() + flat.len() + 1);
            text.push_str(plain);
            if !flat.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&flat);
            }
            (text, true)
        }
        None => (plain.to_string(), false),
    }
}

/// Parses the JSON body of `<script id="{script_id}">`, if any.
pub fn extract_hydration_json(document: &Html, script_id: &str) -> Option<Value> {
    let selector = Selector::parse("script").ok()?;
    let script = document
        .select(&selector)
        .find(|el| el.value().attr("id") == Some(script_id))?;
    let body: String = script.text().collect();
    let body = body.trim();
    if body.is_empty() {
        tracing::debug!("Hydration script {} is empty", script_id);
        return None;
    }
    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Hydration script {} is not valid JSON: {}", script_id, e);
            None
        }
    }
}

/// Renders every scalar leaf of `value` as `<key words> <value>`, separated
/// by ` | `.
///
/// Keys are split into words (`totalNetAssets` becomes `total Net Assets`,
/// `shares_outstanding` becomes `shares outstanding`) so that human label
/// phrases match them. Array items inherit the key of their array. Nulls are
/// dropped. No particular schema is assumed.
pub fn flatten_json(value: &Value) -> String {
    let mut entries = Vec::new();
    flatten_into(value, None, &mut entries);
    entries.join(" | ")
}

fn flatten_into(value: &Value, key: Option<&str>, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                flatten_into(v, Some(k.as_str()), out);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_into(item, key, out);
            }
        }
        Value::Null => {}
        Value::String(s) => push_entry(key, s.trim(), out),
        Value::Number(n) => push_entry(key, &n.to_string(), out),
        Value::Bool(b) => push_entry(key, if *b { "true" } else { "false" }, out),
    }
}

fn push_entry(key: Option<&str>, value: &str, out: &mut Vec<String>) {
    if value.is_empty() {
        return;
    }
    match key.map(key_words) {
        Some(words) if !words.is_empty() => out.push(format!("{} {}", words, value)),
        _ => out.push(value.to_string()),
    }
}

/// `totalNetAssets` -> `total Net Assets`, `as_of-date` -> `as of date`.
fn key_words(key: &str) -> String {
    let mut words = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for ch in key.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !words.is_empty() && !words.ends_with(' ') {
                words.push(' ');
            }
            prev = None;
            continue;
        }
        if ch.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
            words.push(' ');
        }
        words.push(ch);
        prev = Some(ch);
    }
    words.trim_end().to_string()
}
