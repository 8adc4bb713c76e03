use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

static LINK_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"a[href*="/news/"]"#,
        r#"a[href*="/article/"]"#,
        r#"a[href*="/story/"]"#,
        r#"a[href*="/world/"]"#,
        r#"a[href*="/india/"]"#,
        r#"a[href*="/defence/"]"#,
        r#"a[href*="/security/"]"#,
        ".headline a",
        ".title a",
        "h2 a",
        "h3 a",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("static selector"))
    .collect()
});

/// Article links found on a section listing page.
///
/// Hrefs are resolved against `listing_url`, fragments are dropped and only
/// http(s) targets are kept. Order is first-seen across the selector list.
pub fn extract_article_links(html: &str, listing_url: &Url, cap: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for selector in LINK_SELECTORS.iter() {
        for element in document.select(selector) {
            if links.len() >= cap {
                return links;
            }
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Ok(mut resolved) = listing_url.join(href.trim()) else {
                continue;
            };
            if !matches!(resolved.scheme(), "http" | "https") {
                continue;
            }
            resolved.set_fragment(None);

            let link = resolved.to_string();
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<html><body>
        <a href="/news/a">A</a>
        <a href="/news/b#comments">B</a>
        <a href="/news/a">A again</a>
        <h2><a href="https://other.test/story/c">C</a></h2>
        <h3><a href="mailto:desk@news.test">Mail the desk</a></h3>
        <a href="/about">About</a>
    </body></html>"#;

    fn listing_url() -> Url {
        Url::parse("https://news.test/defence").unwrap()
    }

    #[test]
    fn test_links_are_resolved_and_deduplicated() {
        let links = extract_article_links(LISTING, &listing_url(), 20);
        assert_eq!(
            links,
            vec![
                "https://news.test/news/a".to_string(),
                "https://news.test/news/b".to_string(),
                "https://other.test/story/c".to_string(),
            ]
        );
    }

    #[test]
    fn test_links_are_capped() {
        let links = extract_article_links(LISTING, &listing_url(), 2);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], "https://news.test/news/a");
    }

    #[test]
    fn test_no_links() {
        assert!(extract_article_links("<p>nothing</p>", &listing_url(), 20).is_empty());
    }
}
