//! Title and body recovery from article HTML.
//!
//! Both title and body walk their own ordered selector list; the first
//! selector that yields text wins. There is no scoring between strategies.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::ExtractionFailure;
use crate::TARGET_WEB_REQUEST;

pub const NO_TITLE_SENTINEL: &str = "No title found";
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 100;

/// Paragraphs inside a recognised article container must be longer than this.
const CONTAINER_PARAGRAPH_MIN_CHARS: usize = 30;
/// Stricter threshold used when scanning the whole document.
const DOCUMENT_PARAGRAPH_MIN_CHARS: usize = 50;

fn selectors(patterns: &[&str]) -> Vec<Selector> {
    patterns
        .iter()
        .map(|pattern| Selector::parse(pattern).expect("static selector must parse"))
        .collect()
}

static TITLE_SELECTORS: Lazy<Vec<Selector>> =
    Lazy::new(|| selectors(&["h1", "h2", ".headline", ".title", ".article-title", "title"]));

static BODY_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        "article",
        ".article-body",
        ".story-body",
        ".content",
        ".post-content",
        ".entry-content",
        "main",
    ])
});

static DATE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        "time",
        ".publish-date",
        ".published",
        ".date",
        "[datetime]",
        ".article-date",
        ".post-date",
    ])
});

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));

/// What survives extraction of a single page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedArticle {
    pub title: String,
    pub body_text: String,
    /// Best-effort publication date found in the markup.
    pub publication_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy)]
pub struct ContentExtractor {
    pub min_content_length: usize,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        ContentExtractor {
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
        }
    }
}

impl ContentExtractor {
    pub fn new(min_content_length: usize) -> Self {
        ContentExtractor { min_content_length }
    }

    pub fn extract(
        &self,
        raw_markup: &str,
        source_url: &str,
    ) -> Result<ExtractedArticle, ExtractionFailure> {
        let document = Html::parse_document(raw_markup);

        let title = extract_title(&document).unwrap_or_else(|| NO_TITLE_SENTINEL.to_string());
        let body_text = extract_body(&document);

        if body_text.is_empty() {
            debug!(target: TARGET_WEB_REQUEST, "No paragraph text in {}", source_url);
            return Err(ExtractionFailure::EmptyBody);
        }

        let length = body_text.chars().count();
        if length < self.min_content_length {
            debug!(target: TARGET_WEB_REQUEST, "Body of {} too short: {} chars", source_url, length);
            return Err(ExtractionFailure::TooShort {
                length,
                minimum: self.min_content_length,
            });
        }

        Ok(ExtractedArticle {
            title,
            body_text,
            publication_date: extract_publication_date(&document),
        })
    }
}

/// Text content of an element with whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn extract_title(document: &Html) -> Option<String> {
    TITLE_SELECTORS.iter().find_map(|selector| {
        document
            .select(selector)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty())
    })
}

fn paragraphs_longer_than(root: ElementRef<'_>, min_chars: usize) -> Vec<String> {
    root.select(&PARAGRAPH)
        .map(element_text)
        .filter(|text| text.chars().count() > min_chars)
        .collect()
}

fn extract_body(document: &Html) -> String {
    // The first container that holds any <p> decides; if all of its
    // paragraphs are noise we drop to the whole-document scan.
    let container_paragraphs = BODY_SELECTORS
        .iter()
        .find_map(|selector| {
            document
                .select(selector)
                .next()
                .filter(|container| container.select(&PARAGRAPH).next().is_some())
        })
        .map(|container| paragraphs_longer_than(container, CONTAINER_PARAGRAPH_MIN_CHARS))
        .unwrap_or_default();

    let paragraphs = if container_paragraphs.is_empty() {
        paragraphs_longer_than(document.root_element(), DOCUMENT_PARAGRAPH_MIN_CHARS)
    } else {
        container_paragraphs
    };

    paragraphs.join("\n\n")
}

fn extract_publication_date(document: &Html) -> Option<NaiveDate> {
    for selector in DATE_SELECTORS.iter() {
        if let Some(element) = document.select(selector).next() {
            if let Some(date) = element.value().attr("datetime").and_then(parse_date) {
                return Some(date);
            }
            if let Some(date) = parse_date(&element_text(element)) {
                return Some(date);
            }
        }
    }
    None
}

/// Parse a date string in the formats news sites commonly use.
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    let date_str = date_str.trim();
    if date_str.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(date_str) {
        return Some(date.date_naive());
    }

    if let Ok(date) = DateTime::parse_from_rfc2822(date_str) {
        return Some(date.date_naive());
    }

    for format in &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(date_str, format) {
            return Some(date.date());
        }
    }

    for format in &[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d-%m-%Y",
        "%d/%m/%Y",
        "%B %d, %Y",
        "%b %d, %Y",
        "%d %B %Y",
        "%d %b %Y",
    ] {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, format) {
            return Some(date);
        }
    }

    None
}
