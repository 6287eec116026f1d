//! HTML to plain text reduction.

use scraper::{Html, Node};

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Parses `html` and returns its visible text, one space between text nodes.
///
/// The HTML5 parser recovers from any markup, so malformed input only ever
/// produces sparse or empty text.
pub fn html_to_text(html: &str) -> String {
    document_text(&Html::parse_document(html))
}

/// Visible text of an already parsed document.
pub fn document_text(document: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| match a.value() {
            Node::Element(el) => HIDDEN_ELEMENTS.contains(&el.name()),
            _ => false,
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }
    parts.join(" ")
}

/// Collapses every whitespace run to one space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
