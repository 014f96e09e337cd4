//! Web page fetching and main-content extraction.
//!
//! Extraction is a cascade: description meta tags, then known content containers, then every
//! paragraph, then all visible text. Script, style, and noscript content never counts as text.

use super::AcquisitionError;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

const DESCRIPTION_SELECTORS: &[&str] = &[
    r#"meta[name="description"]"#,
    r#"meta[property="og:description"]"#,
    r#"meta[name="og:description"]"#,
];

const CONTAINER_SELECTORS: &[&str] = &[
    "article",
    "main",
    r#"[class*="article-body"]"#,
    r#"[id*="article-body"]"#,
    r#"[class*="abstract"]"#,
    r#"[id*="abstract"]"#,
    r#"[class*="content"]"#,
    r#"[id*="content"]"#,
];

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "dd", "div", "dl", "dt",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head",
    "header", "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td",
    "th", "title", "tr", "ul",
];

pub(super) async fn fetch_url_text(http: &Client, url: &str) -> Result<String, AcquisitionError> {
    let fetch_error = |reason: String| AcquisitionError::Fetch {
        url: url.to_string(),
        reason,
    };

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|error| fetch_error(error.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("server returned {status}")));
    }
    let html = response
        .text()
        .await
        .map_err(|error| fetch_error(format!("failed to read body: {error}")))?;

    let text = extract_main_content(&html);
    tracing::debug!(url, chars = text.len(), "Fetched page content");
    Ok(text)
}

/// Extract the readable content of an HTML page.
///
/// The description (when present) and the main content blocks are joined with blank lines so the
/// summarizer sees them as separate paragraphs.
pub fn extract_main_content(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut sections = Vec::new();

    if let Some(description) = description(&document) {
        sections.push(description);
    }

    let mut blocks = container_blocks(&document);
    if blocks.is_empty() && sections.is_empty() {
        blocks = select_texts(&document, "p");
    }
    if blocks.is_empty() && sections.is_empty() {
        let body = visible_text(document.root_element());
        if !body.is_empty() {
            blocks.push(body);
        }
    }

    for block in blocks {
        if !sections.contains(&block) {
            sections.push(block);
        }
    }
    sections.join("\n\n")
}

fn description(document: &Html) -> Option<String> {
    DESCRIPTION_SELECTORS.iter().find_map(|raw| {
        let selector = Selector::parse(raw).ok()?;
        document.select(&selector).find_map(|element| {
            let content = normalize_whitespace(element.value().attr("content")?);
            (!content.is_empty()).then_some(content)
        })
    })
}

fn container_blocks(document: &Html) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    for raw in CONTAINER_SELECTORS {
        for text in select_texts(document, raw) {
            // Earlier selectors are more specific; wrappers around a kept block add boilerplate.
            let overlaps = blocks
                .iter()
                .any(|existing| existing.contains(&text) || text.contains(existing.as_str()));
            if !overlaps {
                blocks.push(text);
            }
        }
    }
    blocks
}

fn select_texts(document: &Html, raw: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(raw) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(visible_text)
        .filter(|text| !text.is_empty())
        .collect()
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    push_visible_text(element, &mut text);
    normalize_whitespace(&text)
}

/// Inline markup joins its text directly; block elements are separated by whitespace.
fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if HIDDEN_ELEMENTS.contains(&name) {
        return;
    }
    let block = BLOCK_ELEMENTS.contains(&name);
    if block {
        out.push(' ');
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            push_visible_text(child, out);
        }
    }
    if block {
        out.push(' ');
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
