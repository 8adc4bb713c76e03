//! Raw candidate files.
//!
//! Fetched candidates can be archived as one JSON file each, plus a batch
//! summary, and any directory of such files can be imported later. Other
//! scrapers can feed the pipeline by dropping files in the same format.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::extract::word_count;
use crate::fetcher::Candidate;
use crate::TARGET_MONITOR;

const MAX_SLUG_CHARS: usize = 50;

/// Coarsest modification-time resolution in common use (FAT).
const MTIME_GRANULARITY: Duration = Duration::from_secs(2);

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("static regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("static regex"));

/// One article candidate as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    pub content: String,
    pub url: String,
    pub scraped_timestamp: String,
    #[serde(default)]
    pub content_length: usize,
    #[serde(default)]
    pub word_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
}

impl RawArticle {
    /// Accepts RFC 3339 and naive ISO timestamps (read as UTC).
    pub fn scraped_at(&self) -> Option<DateTime<Utc>> {
        let value = self.scraped_timestamp.trim();
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
            return Some(timestamp.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }
}

impl From<&Candidate> for RawArticle {
    fn from(candidate: &Candidate) -> Self {
        RawArticle {
            title: candidate.title.clone(),
            content: candidate.body_text.clone(),
            url: candidate.url.clone(),
            scraped_timestamp: candidate.fetched_at.to_rfc3339(),
            content_length: candidate.body_text.chars().count(),
            word_count: word_count(&candidate.body_text),
            source_domain: candidate.source_domain.clone(),
            publication_date: candidate
                .publication_date
                .map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub title: String,
    pub url: String,
    pub source: Option<String>,
    pub word_count: usize,
}

/// Written next to each archived batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_articles: usize,
    pub scraping_timestamp: String,
    pub sources_scraped: Vec<String>,
    pub articles: Vec<SummaryEntry>,
}

/// Which raw files an import picks up.
///
/// A file is admitted when it was modified no earlier than `since`, give or
/// take the filesystem's timestamp granularity, and it is not listed in
/// `handled` with its current modification time. The default admits
/// everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportWindow {
    pub since: Option<SystemTime>,
    pub handled: BTreeMap<PathBuf, SystemTime>,
}

impl ImportWindow {
    /// Moves the window to start at `since` and remembers `handled` files.
    /// Entries old enough to fall outside the window for good are dropped.
    pub fn advance(
        &mut self,
        since: SystemTime,
        handled: impl IntoIterator<Item = (PathBuf, SystemTime)>,
    ) {
        self.handled.extend(handled);
        self.handled
            .retain(|_, modified| *modified + MTIME_GRANULARITY >= since);
        self.since = Some(since);
    }

    fn admits(&self, path: &Path, modified: Option<SystemTime>) -> bool {
        let Some(modified) = modified else {
            return self.since.is_none();
        };
        if self.handled.get(path) == Some(&modified) {
            return false;
        }
        self.since
            .map_or(true, |since| modified + MTIME_GRANULARITY >= since)
    }
}

/// Files read back from a raw directory.
#[derive(Debug, Default)]
pub struct RawBatch {
    pub articles: Vec<(PathBuf, RawArticle)>,
    pub unreadable: usize,
    /// Every admitted file, readable or not, with its modification time.
    pub seen: BTreeMap<PathBuf, SystemTime>,
}

/// File-name stem for an article title; `n` is the 1-based batch position.
pub fn slug(title: &str, n: usize) -> String {
    let lowered = title.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, "");
    let joined = SEPARATORS.replace_all(&cleaned, "_");
    let truncated: String = joined.chars().take(MAX_SLUG_CHARS).collect();
    let trimmed = truncated.trim_matches('_');

    if trimmed.is_empty() {
        format!("defense_article_{}", n)
    } else {
        trimmed.to_string()
    }
}

/// Archives `candidates` under `dir`, returning the article file paths.
pub fn save_candidates(
    dir: &Path,
    candidates: &[Candidate],
    now: &DateTime<Utc>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let stamp = now.format("%Y%m%d_%H%M%S").to_string();

    let mut written = Vec::with_capacity(candidates.len());
    let mut raw_articles = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        let n = index + 1;
        let raw = RawArticle::from(candidate);
        let path = dir.join(format!("{}_{}_{}.json", slug(&raw.title, n), stamp, n));
        fs::write(&path, serde_json::to_string_pretty(&raw)?)?;
        debug!(target: TARGET_MONITOR, "Saved {}", path.display());
        written.push(path);
        raw_articles.push(raw);
    }

    let sources_scraped: BTreeSet<String> = raw_articles
        .iter()
        .filter_map(|raw| raw.source_domain.clone())
        .collect();
    let summary = BatchSummary {
        total_articles: raw_articles.len(),
        scraping_timestamp: stamp.clone(),
        sources_scraped: sources_scraped.into_iter().collect(),
        articles: raw_articles
            .iter()
            .map(|raw| SummaryEntry {
                title: raw.title.clone(),
                url: raw.url.clone(),
                source: raw.source_domain.clone(),
                word_count: raw.word_count,
            })
            .collect(),
    };
    let summary_path = dir.join(format!("defense_summary_{}.json", stamp));
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;

    info!(
        target: TARGET_MONITOR,
        "Archived {} candidates to {}",
        written.len(),
        dir.display()
    );
    Ok(written)
}

fn is_article_file(path: &Path) -> bool {
    let is_json = path.extension().map_or(false, |ext| ext == "json");
    let is_summary = path
        .file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.contains("summary"));
    is_json && !is_summary
}

pub(crate) fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

fn article_files(dir: &Path, window: &ImportWindow) -> Result<Vec<(PathBuf, Option<SystemTime>)>> {
    let mut files: Vec<(PathBuf, Option<SystemTime>)> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| is_article_file(path))
        .map(|path| {
            let modified = modified_time(&path);
            (path, modified)
        })
        .filter(|(path, modified)| window.admits(path, *modified))
        .collect();
    files.sort();
    Ok(files)
}

/// Reads every article file in `dir` admitted by `window`. Files that cannot
/// be read or parsed are counted and skipped.
pub fn load_raw_articles(dir: &Path, window: &ImportWindow) -> Result<RawBatch> {
    let mut batch = RawBatch::default();

    for (path, modified) in article_files(dir, window)? {
        if let Some(modified) = modified {
            batch.seen.insert(path.clone(), modified);
        }
        let parsed = fs::read_to_string(&path)
            .map_err(crate::error::PipelineError::from)
            .and_then(|text| serde_json::from_str::<RawArticle>(&text).map_err(Into::into));
        match parsed {
            Ok(article) => batch.articles.push((path, article)),
            Err(err) => {
                warn!(target: TARGET_MONITOR, "Skipping {}: {}", path.display(), err);
                batch.unreadable += 1;
            }
        }
    }

    Ok(batch)
}

/// Whether `dir` holds any article file `window` would admit.
pub fn has_new_files(dir: &Path, window: &ImportWindow) -> bool {
    article_files(dir, window)
        .map(|files| !files.is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn candidate(title: &str, url: &str) -> Candidate {
        Candidate {
            title: title.to_string(),
            body_text: "Troops were deployed along the border overnight.".to_string(),
            url: url.to_string(),
            fetched_at: Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap(),
            source_domain: Some("news.test".to_string()),
            publication_date: NaiveDate::from_ymd_opt(2026, 2, 3),
        }
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Army Deploys Troops: Border -- Update!", 1), "army_deploys_troops_border_update");
        assert_eq!(slug("???", 4), "defense_article_4");
        assert_eq!(slug(&"a".repeat(80), 1).len(), 50);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap();
        let candidates = vec![
            candidate("Army drills", "https://news.test/a"),
            candidate("Navy drills", "https://news.test/b"),
        ];

        let written = save_candidates(dir.path(), &candidates, &now).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("army_drills_20260203_040506_1.json"));
        assert!(dir.path().join("defense_summary_20260203_040506.json").exists());

        let batch = load_raw_articles(dir.path(), &ImportWindow::default()).unwrap();
        assert_eq!(batch.unreadable, 0);
        assert_eq!(batch.articles.len(), 2);
        let (_, first) = &batch.articles[0];
        assert_eq!(first.url, "https://news.test/a");
        assert_eq!(first.word_count, 7);
        assert_eq!(first.publication_date.as_deref(), Some("2026-02-03"));
        assert_eq!(first.scraped_at(), Some(now));

        let summary: BatchSummary = serde_json::from_str(
            &fs::read_to_string(dir.path().join("defense_summary_20260203_040506.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(summary.total_articles, 2);
        assert_eq!(summary.sources_scraped, vec!["news.test"]);
    }

    #[test]
    fn test_load_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(
            dir.path().join("external.json"),
            r#"{"title": "T", "content": "C", "url": "https://x.test/", "scraped_timestamp": "2025-07-01T10:20:30.123456"}"#,
        )
        .unwrap();

        let batch = load_raw_articles(dir.path(), &ImportWindow::default()).unwrap();
        assert_eq!(batch.unreadable, 1);
        assert_eq!(batch.articles.len(), 1);
        let (_, article) = &batch.articles[0];
        assert_eq!(article.content_length, 0);
        assert_eq!(
            article.scraped_at(),
            Some(Utc.with_ymd_and_hms(2025, 7, 1, 10, 20, 30).unwrap() + chrono::Duration::microseconds(123456))
        );
    }

    fn window_since(since: SystemTime) -> ImportWindow {
        ImportWindow {
            since: Some(since),
            ..ImportWindow::default()
        }
    }

    fn set_modified(path: &Path, time: SystemTime) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_has_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let before = window_since(SystemTime::now() - Duration::from_secs(60));
        assert!(!has_new_files(dir.path(), &before));

        fs::write(dir.path().join("defense_summary_x.json"), "{}").unwrap();
        assert!(!has_new_files(dir.path(), &before));

        fs::write(dir.path().join("a.json"), "{}").unwrap();
        assert!(has_new_files(dir.path(), &before));
        assert!(!has_new_files(
            dir.path(),
            &window_since(SystemTime::now() + Duration::from_secs(60))
        ));
    }

    #[test]
    fn test_window_tolerates_coarse_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let since = SystemTime::now();
        let path = dir.path().join("a.json");
        fs::write(&path, "{}").unwrap();

        // written in the same tick the check was recorded, stamped earlier
        set_modified(&path, since - Duration::from_secs(1));
        assert!(has_new_files(dir.path(), &window_since(since)));

        set_modified(&path, since);
        assert!(has_new_files(dir.path(), &window_since(since)));

        set_modified(&path, since - Duration::from_secs(10));
        assert!(!has_new_files(dir.path(), &window_since(since)));
    }

    #[test]
    fn test_window_skips_handled_files_until_they_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, "{}").unwrap();
        let stamp = SystemTime::now() - Duration::from_secs(5);
        set_modified(&path, stamp);

        let batch = load_raw_articles(dir.path(), &ImportWindow::default()).unwrap();
        assert_eq!(batch.unreadable, 1);
        assert_eq!(batch.seen.get(&path), modified_time(&path).as_ref());

        let window = ImportWindow {
            since: None,
            handled: batch.seen,
        };
        assert!(!has_new_files(dir.path(), &window));

        set_modified(&path, stamp + Duration::from_secs(3));
        assert!(has_new_files(dir.path(), &window));
    }

    #[test]
    fn test_advance_forgets_files_outside_the_window() {
        let now = SystemTime::now();
        let recent = PathBuf::from("recent.json");
        let old = PathBuf::from("old.json");
        let mut window = ImportWindow::default();

        window.advance(
            now,
            [(recent.clone(), now - Duration::from_secs(1)), (old.clone(), now - Duration::from_secs(30))],
        );
        assert_eq!(window.since, Some(now));
        assert!(window.handled.contains_key(&recent));
        assert!(!window.handled.contains_key(&old));

        window.advance(now + Duration::from_secs(60), []);
        assert!(window.handled.is_empty());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_raw_articles(&dir.path().join("absent"), &ImportWindow::default()).is_err());
    }
}
