//! Source fetching.
//!
//! Every section of every source is scanned on a bounded pool. A scan fetches
//! the listing page, follows the article links found there one by one with a
//! politeness delay, runs each page through the [`ContentExtractor`] and the
//! [`RelevanceGate`], and pushes survivors into one shared result list.

pub mod client;
pub mod links;
pub mod sources;

use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::classifier::RelevanceGate;
use crate::extract::{ContentExtractor, DEFAULT_MIN_CONTENT_LENGTH};
use crate::TARGET_WEB_REQUEST;

pub use client::{HttpPageSource, PageSource};
pub use links::extract_article_links;
pub use sources::{default_sources, Source};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Concurrent section scans.
    pub max_workers: usize,
    pub request_timeout: Duration,
    /// Pause before each article fetch within a section.
    pub request_delay: Duration,
    pub max_links_per_section: usize,
    pub min_content_length: usize,
    /// Drop candidates whose parsed publication date is not today (UTC).
    pub today_only: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            max_workers: 3,
            request_timeout: Duration::from_secs(15),
            request_delay: Duration::from_millis(1000),
            max_links_per_section: 20,
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
            today_only: false,
        }
    }
}

/// A fetched page that passed extraction and the relevance gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub body_text: String,
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub source_domain: Option<String>,
    pub publication_date: Option<NaiveDate>,
}

/// Pages lost during a fetch, by reason.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchTally {
    /// Listing or article pages that could not be retrieved.
    pub fetch_failures: usize,
    pub extraction_failures: usize,
    /// Rejected by the relevance gate.
    pub gated: usize,
    /// Dated some other day while `today_only` is set.
    pub stale: usize,
}

impl FetchTally {
    fn add(&mut self, other: FetchTally) {
        self.fetch_failures += other.fetch_failures;
        self.extraction_failures += other.extraction_failures;
        self.gated += other.gated;
        self.stale += other.stale;
    }

    /// Pages that were retrieved but not kept.
    pub fn dropped(&self) -> usize {
        self.extraction_failures + self.gated + self.stale
    }
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub candidates: Vec<Candidate>,
    pub tally: FetchTally,
}

/// Scans every section of `sources` with at most `config.max_workers`
/// concurrent scans. Candidate order across sections is unspecified.
pub async fn fetch_all(
    sources: &[Source],
    config: &FetchConfig,
    pages: Arc<dyn PageSource>,
) -> FetchOutcome {
    let mut sections = Vec::new();
    for source in sources {
        match source.section_urls() {
            Ok(urls) => sections.extend(urls.into_iter().map(|url| (source.name.clone(), url))),
            Err(err) => warn!(target: TARGET_WEB_REQUEST, "Skipping source {}: {}", source, err),
        }
    }

    info!(
        target: TARGET_WEB_REQUEST,
        "Scanning {} sections from {} sources with {} workers",
        sections.len(),
        sources.len(),
        config.max_workers.max(1)
    );

    let results: Arc<Mutex<Vec<Candidate>>> = Arc::new(Mutex::new(Vec::new()));
    let tally = Arc::new(Mutex::new(FetchTally::default()));
    let today = Utc::now().date_naive();

    stream::iter(sections)
        .map(|(source_name, section_url)| {
            let pages = Arc::clone(&pages);
            let results = Arc::clone(&results);
            let tally = Arc::clone(&tally);
            async move {
                let (found, section_tally) =
                    scan_section(&source_name, &section_url, config, pages.as_ref(), today).await;
                results.lock().await.extend(found);
                tally.lock().await.add(section_tally);
            }
        })
        .buffer_unordered(config.max_workers.max(1))
        .collect::<Vec<()>>()
        .await;

    let candidates = std::mem::take(&mut *results.lock().await);
    let tally = *tally.lock().await;
    info!(
        target: TARGET_WEB_REQUEST,
        "Fetched {} candidates ({} fetch failures, {} extraction failures, {} not relevant, {} not from today)",
        candidates.len(),
        tally.fetch_failures,
        tally.extraction_failures,
        tally.gated,
        tally.stale
    );

    FetchOutcome { candidates, tally }
}

async fn scan_section(
    source_name: &str,
    section_url: &Url,
    config: &FetchConfig,
    pages: &dyn PageSource,
    today: NaiveDate,
) -> (Vec<Candidate>, FetchTally) {
    let mut tally = FetchTally::default();
    let mut candidates = Vec::new();

    let listing = match pages.fetch_page(section_url.as_str()).await {
        Ok(listing) => listing,
        Err(err) => {
            warn!(target: TARGET_WEB_REQUEST, "{}: listing unavailable: {}", source_name, err);
            tally.fetch_failures += 1;
            return (candidates, tally);
        }
    };

    let links = extract_article_links(&listing, section_url, config.max_links_per_section);
    debug!(
        target: TARGET_WEB_REQUEST,
        "{}: {} article links on {}",
        source_name,
        links.len(),
        section_url
    );

    let extractor = ContentExtractor::new(config.min_content_length);
    let gate = RelevanceGate::default();

    for link in links {
        if !config.request_delay.is_zero() {
            tokio::time::sleep(config.request_delay).await;
        }

        let markup = match pages.fetch_page(&link).await {
            Ok(markup) => markup,
            Err(err) => {
                debug!(target: TARGET_WEB_REQUEST, "Skipping {}: {}", link, err);
                tally.fetch_failures += 1;
                continue;
            }
        };

        let article = match extractor.extract(&markup, &link) {
            Ok(article) => article,
            Err(reason) => {
                debug!(target: TARGET_WEB_REQUEST, "Dropping {}: {}", link, reason);
                tally.extraction_failures += 1;
                continue;
            }
        };

        if config.today_only {
            if let Some(published) = article.publication_date {
                if published != today {
                    tally.stale += 1;
                    continue;
                }
            }
        }

        if !gate.accepts(&article.title, &article.body_text) {
            tally.gated += 1;
            continue;
        }

        debug!(target: TARGET_WEB_REQUEST, "{}: kept {}", source_name, article.title);
        let source_domain = Url::parse(&link)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string));
        candidates.push(Candidate {
            title: article.title,
            body_text: article.body_text,
            url: link,
            fetched_at: Utc::now(),
            source_domain,
            publication_date: article.publication_date,
        });
    }

    (candidates, tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    const LISTING: &str = r#"<html><body>
        <a href="/news/a">Army drills</a>
        <a href="/news/b">Short</a>
        <h2><a href="https://other.test/story/c">Garden</a></h2>
        <a href="/news/dead">Gone</a>
    </body></html>"#;

    const RELEVANT: &str = "<html><h1>Army drills</h1><article><p>The Indian Army conducted a large exercise near the border on Monday, moving several armoured units into forward positions.</p></article></html>";

    const SHORT: &str = "<html><h1>Harbour</h1><article><p>The navy held a short ceremony at the harbour today.</p></article></html>";

    const IRRELEVANT: &str = "<html><h1>Garden show</h1><article><p>The garden show opened with tulips and roses. Visitors enjoyed the sunny weather and tasted fresh honey from nearby farms all afternoon.</p></article></html>";

    const OLD_NEWS: &str = "<html><h1>Army drills</h1><time datetime=\"2020-01-01\">1 Jan</time><article><p>The Indian Army conducted a large exercise near the border on Monday, moving several armoured units into forward positions.</p></article></html>";

    struct FakeSite {
        pages: HashMap<String, String>,
        requests: AtomicUsize,
    }

    impl FakeSite {
        fn new(pages: &[(&str, &str)]) -> Self {
            FakeSite {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                requests: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageSource for FakeSite {
        async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.pages.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn test_config() -> FetchConfig {
        FetchConfig {
            request_delay: Duration::ZERO,
            ..FetchConfig::default()
        }
    }

    fn site(article: &str) -> Arc<FakeSite> {
        Arc::new(FakeSite::new(&[
            ("https://news.test/defence", LISTING),
            ("https://news.test/news/a", article),
            ("https://news.test/news/b", SHORT),
            ("https://other.test/story/c", IRRELEVANT),
        ]))
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_only_relevant_extracted_pages() {
        let site = site(RELEVANT);
        let sources = vec![Source::new("Test", "https://news.test/", &["defence", "missing"])];

        let outcome = fetch_all(&sources, &test_config(), site.clone()).await;

        assert_eq!(outcome.candidates.len(), 1);
        let candidate = &outcome.candidates[0];
        assert_eq!(candidate.url, "https://news.test/news/a");
        assert_eq!(candidate.title, "Army drills");
        assert_eq!(candidate.source_domain.as_deref(), Some("news.test"));
        assert!(candidate.body_text.starts_with("The Indian Army"));
        // two listings plus four article links
        assert_eq!(site.requests.load(Ordering::SeqCst), 6);
        // missing listing and dead link; short page; garden page
        assert_eq!(
            outcome.tally,
            FetchTally {
                fetch_failures: 2,
                extraction_failures: 1,
                gated: 1,
                stale: 0,
            }
        );
        assert_eq!(outcome.tally.dropped(), 2);
    }

    #[tokio::test]
    async fn test_link_cap_limits_requests() {
        let site = site(RELEVANT);
        let sources = vec![Source::new("Test", "https://news.test/", &["defence"])];
        let config = FetchConfig {
            max_links_per_section: 1,
            ..test_config()
        };

        let outcome = fetch_all(&sources, &config, site.clone()).await;
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(site.requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_today_only_drops_dated_pages() {
        let sources = vec![Source::new("Test", "https://news.test/", &["defence"])];

        let kept = fetch_all(&sources, &test_config(), site(OLD_NEWS)).await;
        assert_eq!(kept.candidates.len(), 1);
        assert_eq!(
            kept.candidates[0].publication_date,
            NaiveDate::from_ymd_opt(2020, 1, 1)
        );

        let config = FetchConfig {
            today_only: true,
            ..test_config()
        };
        let dropped = fetch_all(&sources, &config, site(OLD_NEWS)).await;
        assert!(dropped.candidates.is_empty());
        assert_eq!(dropped.tally.stale, 1);
    }

    #[tokio::test]
    async fn test_unreachable_sources_yield_nothing() {
        let site = Arc::new(FakeSite::new(&[]));
        let sources = default_sources();
        let section_count: usize = sources.iter().map(|s| s.sections.len()).sum();

        let outcome = fetch_all(&sources, &test_config(), site).await;
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.tally.fetch_failures, section_count);
    }

    /// Every page is slow and missing; tracks how many fetches overlap.
    #[derive(Default)]
    struct SlowSite {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl PageSource for SlowSite {
        async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    #[tokio::test]
    async fn test_section_scans_stay_within_worker_bound() {
        let site = Arc::new(SlowSite::default());
        let sources = vec![Source::new(
            "Slow",
            "https://slow.test/",
            &["a", "b", "c", "d", "e", "f"],
        )];
        let config = FetchConfig {
            max_workers: 2,
            ..test_config()
        };

        let outcome = fetch_all(&sources, &config, site.clone()).await;
        assert_eq!(outcome.tally.fetch_failures, 6);
        assert_eq!(site.peak.load(Ordering::SeqCst), 2);
        assert_eq!(site.in_flight.load(Ordering::SeqCst), 0);
    }

    /// Serves `inner` and remembers when each URL was requested.
    struct TimedSite {
        inner: FakeSite,
        log: std::sync::Mutex<Vec<(String, Instant)>>,
    }

    #[async_trait]
    impl PageSource for TimedSite {
        async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
            if let Ok(mut log) = self.log.lock() {
                log.push((url.to_string(), Instant::now()));
            }
            self.inner.fetch_page(url).await
        }
    }

    #[tokio::test]
    async fn test_delay_spaces_link_fetches_within_a_section() {
        let listing = r#"<a href="/news/1">One</a><a href="/news/2">Two</a><a href="/news/3">Three</a>"#;
        let site = Arc::new(TimedSite {
            inner: FakeSite::new(&[
                ("https://news.test/defence", listing),
                ("https://news.test/news/1", RELEVANT),
                ("https://news.test/news/2", RELEVANT),
                ("https://news.test/news/3", RELEVANT),
            ]),
            log: std::sync::Mutex::new(Vec::new()),
        });
        let sources = vec![Source::new("Test", "https://news.test/", &["defence"])];
        let delay = Duration::from_millis(40);
        let config = FetchConfig {
            request_delay: delay,
            ..test_config()
        };

        let outcome = fetch_all(&sources, &config, site.clone()).await;
        assert_eq!(outcome.candidates.len(), 3);

        let log = site.log.lock().unwrap();
        let urls: Vec<&str> = log.iter().map(|(url, _)| url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://news.test/defence",
                "https://news.test/news/1",
                "https://news.test/news/2",
                "https://news.test/news/3",
            ]
        );
        for pair in log.windows(2) {
            assert!(
                pair[1].1.duration_since(pair[0].1) >= delay,
                "{} followed {} too soon",
                pair[1].0,
                pair[0].0
            );
        }
    }
}
