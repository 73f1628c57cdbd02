//! HTML helpers: visible text and anchors.

use std::collections::HashSet;

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{ProviderError, Result};

const SKIPPED: [&str; 6] = ["script", "style", "noscript", "iframe", "svg", "head"];

/// Visible text of an HTML page, one text run per line.
pub fn strip_markup(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts = Vec::new();
    collect_text(document.root_element(), &mut parts);
    parts.join("\n")
}

fn collect_text(element: ElementRef<'_>, parts: &mut Vec<String>) {
    if SKIPPED.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !flat.is_empty() {
                    parts.push(flat);
                }
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, parts);
                }
            }
            _ => {}
        }
    }
}

/// A link found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub url: String,
    pub text: String,
}

/// Every http(s) anchor of `html`, resolved against `base_url`, deduplicated
/// by URL in document order. Fragments are dropped.
pub fn extract_anchors(html: &str, base_url: &str) -> Result<Vec<Anchor>> {
    let base = Url::parse(base_url).map_err(|e| ProviderError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    let selector = Selector::parse("a[href]").map_err(|e| ProviderError::MalformedResponse(format!("{e:?}")))?;
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut anchors = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }
        let Ok(mut url) = base.join(href) else {
            continue;
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            continue;
        }
        url.set_fragment(None);
        let url = url.to_string();
        if seen.insert(url.clone()) {
            let text = element.text().collect::<Vec<_>>().join(" ");
            anchors.push(Anchor {
                url,
                text: text.split_whitespace().collect::<Vec<_>>().join(" "),
            });
        }
    }
    Ok(anchors)
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_markup_keeps_visible_text() {
        let html = r#"<html><head><title>T</title><script>var x = 1;</script></head>
            <body><h1>Widget</h1><style>.a{}</style><p>Price:   <b>$10</b></p></body></html>"#;
        let text = strip_markup(html);
        assert_eq!(text, "Widget\nPrice:\n$10");
    }

    #[test]
    fn anchors_are_resolved_and_deduplicated() {
        let html = r##"
            <a href="/jobs/1">Engineer</a>
            <a href="/jobs/1#apply">Apply</a>
            <a href="https://other.example/x">  Other
               site </a>
            <a href="#top">Top</a>
            <a href="mailto:hr@example.com">Mail</a>
            <a href="javascript:void(0)">JS</a>
            <a href="jobs/2">Relative</a>
        "##;
        let anchors = extract_anchors(html, "https://example.com/careers/").unwrap();
        let urls: Vec<_> = anchors.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/jobs/1",
                "https://other.example/x",
                "https://example.com/careers/jobs/2",
            ]
        );
        assert_eq!(anchors[0].text, "Engineer");
        assert_eq!(anchors[1].text, "Other site");
    }

    #[test]
    fn invalid_base_is_an_error() {
        assert!(extract_anchors("<a href='/x'>x</a>", "not a url").is_err());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
