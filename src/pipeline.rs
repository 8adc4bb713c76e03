//! Candidate → classify → enrich → persist.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classifier::{Classification, Classifier, ScoringStrategy, ThreatLevel};
use crate::db::{ArticleRecord, Database, StoredArticle};
use crate::entity::{Entity, EntityExtractor, PatternEntityExtractor};
use crate::error::{ExtractionFailure, Result};
use crate::extract::DEFAULT_MIN_CONTENT_LENGTH;
use crate::fetcher::Candidate;
use crate::ingest::{load_raw_articles, ImportWindow, RawArticle, RawBatch};
use crate::TARGET_CLASSIFIER;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Stored {
        article_id: i64,
        threat_level: ThreatLevel,
    },
    Skipped(ExtractionFailure),
}

/// Tallies for a batch of articles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub processed: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl BatchStats {
    pub fn record(&mut self, result: &Result<Outcome>) {
        match result {
            Ok(Outcome::Stored { .. }) => self.processed += 1,
            Ok(Outcome::Skipped(_)) => self.skipped += 1,
            Err(_) => self.errored += 1,
        }
    }

    pub fn merge(&mut self, other: BatchStats) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.errored += other.errored;
    }
}

/// The text an article is scored from, with provenance.
struct ArticleInput<'a> {
    url: &'a str,
    title: &'a str,
    content: &'a str,
    scraped_at: DateTime<Utc>,
    source_domain: Option<String>,
    publication_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct Pipeline {
    classifier: Classifier,
    entity_extractor: Arc<dyn EntityExtractor>,
    min_content_length: usize,
}

impl Pipeline {
    pub fn new(
        strategy: ScoringStrategy,
        entity_extractor: Arc<dyn EntityExtractor>,
        min_content_length: usize,
    ) -> Self {
        Pipeline {
            classifier: Classifier::new(strategy),
            entity_extractor,
            min_content_length,
        }
    }

    /// Pattern-based entities and the default content minimum.
    pub fn with_strategy(strategy: ScoringStrategy) -> Self {
        Self::new(
            strategy,
            Arc::new(PatternEntityExtractor),
            DEFAULT_MIN_CONTENT_LENGTH,
        )
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Scores and enriches text without touching the store.
    pub fn analyze(&self, content: &str) -> (Classification, Vec<Entity>) {
        let classification = self.classifier.classify(content);
        let entities = self.entity_extractor.extract_entities(content).to_entities();
        debug!(
            target: TARGET_CLASSIFIER,
            "{} score {} categories {:?} indicators {:?}",
            classification.threat_level,
            classification.relevance_score,
            classification.detected_categories,
            classification.key_indicators
        );
        (classification, entities)
    }

    fn check_length(&self, content: &str) -> std::result::Result<(), ExtractionFailure> {
        let length = content.trim().chars().count();
        if length == 0 {
            Err(ExtractionFailure::EmptyBody)
        } else if length < self.min_content_length {
            Err(ExtractionFailure::TooShort {
                length,
                minimum: self.min_content_length,
            })
        } else {
            Ok(())
        }
    }

    async fn persist(&self, db: &Database, input: ArticleInput<'_>) -> Result<Outcome> {
        if let Err(reason) = self.check_length(input.content) {
            debug!(target: TARGET_CLASSIFIER, "Skipping {}: {}", input.url, reason);
            return Ok(Outcome::Skipped(reason));
        }

        let (classification, entities) = self.analyze(input.content);
        let mut record = ArticleRecord::new(
            input.url,
            input.title,
            input.content,
            input.scraped_at,
            &classification,
        );
        record.source_domain = input.source_domain;
        record.publication_date = input.publication_date;

        let article_id = db.upsert_article(&record, &entities).await?;
        Ok(Outcome::Stored {
            article_id,
            threat_level: classification.threat_level,
        })
    }

    pub async fn process_candidate(&self, db: &Database, candidate: &Candidate) -> Result<Outcome> {
        self.persist(
            db,
            ArticleInput {
                url: &candidate.url,
                title: &candidate.title,
                content: &candidate.body_text,
                scraped_at: candidate.fetched_at,
                source_domain: candidate.source_domain.clone(),
                publication_date: candidate.publication_date,
            },
        )
        .await
    }

    pub async fn process_raw_article(&self, db: &Database, raw: &RawArticle) -> Result<Outcome> {
        self.persist(
            db,
            ArticleInput {
                url: &raw.url,
                title: &raw.title,
                content: &raw.content,
                scraped_at: raw.scraped_at().unwrap_or_else(Utc::now),
                source_domain: raw.source_domain.clone(),
                publication_date: raw
                    .publication_date
                    .as_deref()
                    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            },
        )
        .await
    }

    /// Imports the raw article files in `dir` admitted by `window`.
    pub async fn process_directory(
        &self,
        db: &Database,
        dir: &Path,
        window: &ImportWindow,
    ) -> Result<BatchStats> {
        let batch = load_raw_articles(dir, window)?;
        let stats = self.process_raw_batch(db, &batch).await;
        info!(
            target: TARGET_CLASSIFIER,
            "Imported {}: {} stored, {} skipped, {} errors",
            dir.display(),
            stats.processed,
            stats.skipped,
            stats.errored
        );
        Ok(stats)
    }

    /// Stores every article of an already loaded batch. Unreadable files
    /// count as errors.
    pub async fn process_raw_batch(&self, db: &Database, batch: &RawBatch) -> BatchStats {
        let mut stats = BatchStats {
            errored: batch.unreadable,
            ..BatchStats::default()
        };

        for (path, raw) in &batch.articles {
            let result = self.process_raw_article(db, raw).await;
            if let Err(err) = &result {
                warn!(target: TARGET_CLASSIFIER, "Failed to process {}: {}", path.display(), err);
            }
            stats.record(&result);
        }
        stats
    }

    /// Re-scores every stored article from its stored content and rewrites
    /// its classification, entities and alert.
    pub async fn recompute_all(&self, db: &Database) -> Result<BatchStats> {
        let articles = db.all_articles().await?;
        let mut stats = BatchStats::default();

        for article in &articles {
            let result = self.recompute(db, article).await;
            if let Err(err) = &result {
                warn!(target: TARGET_CLASSIFIER, "Failed to recompute {}: {}", article.url, err);
            }
            stats.record(&result);
        }

        info!(
            target: TARGET_CLASSIFIER,
            "Recomputed {} of {} articles ({} skipped, {} errors)",
            stats.processed,
            articles.len(),
            stats.skipped,
            stats.errored
        );
        Ok(stats)
    }

    async fn recompute(&self, db: &Database, article: &StoredArticle) -> Result<Outcome> {
        let scraped_at = DateTime::parse_from_rfc3339(&article.scraped_timestamp)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        // Stored rows are never dropped here, only rescored.
        let (classification, entities) = self.analyze(&article.content);
        let mut record = ArticleRecord::new(
            &article.url,
            &article.title,
            &article.content,
            scraped_at,
            &classification,
        );
        record.source_domain = article.source_domain.clone();
        record.publication_date = article
            .publication_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        let article_id = db.upsert_article(&record, &entities).await?;
        Ok(Outcome::Stored {
            article_id,
            threat_level: classification.threat_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    const MILITARY_TEXT: &str = "The Indian Army deployed additional troops along the frontier after reports of infiltration, officials said on Tuesday evening.";
    const CIVIC_TEXT: &str = "The city council approved a new budget for parks, libraries and public transport during a long evening session on Thursday.";

    fn raw(url: &str, content: &str) -> RawArticle {
        RawArticle {
            title: "Update".to_string(),
            content: content.to_string(),
            url: url.to_string(),
            scraped_timestamp: "2026-04-01T08:00:00Z".to_string(),
            content_length: content.len(),
            word_count: 0,
            source_domain: Some("example.com".to_string()),
            publication_date: None,
        }
    }

    #[tokio::test]
    async fn test_reingestion_replaces_entities() {
        let db = Database::in_memory().await.unwrap();
        let pipeline = Pipeline::with_strategy(ScoringStrategy::Full);

        let Outcome::Stored { article_id, .. } = pipeline
            .process_raw_article(&db, &raw("https://example.com/a", MILITARY_TEXT))
            .await
            .unwrap()
        else {
            panic!("first ingestion should be stored");
        };
        let first = db.entities_for_article(article_id).await.unwrap();
        assert!(first
            .iter()
            .any(|e| e.entity_type == EntityType::MilitaryUnit && e.text == "Indian Army"));

        let Outcome::Stored {
            article_id: second_id,
            ..
        } = pipeline
            .process_raw_article(&db, &raw("https://example.com/a", CIVIC_TEXT))
            .await
            .unwrap()
        else {
            panic!("second ingestion should be stored");
        };
        assert_eq!(article_id, second_id);
        assert_eq!(db.article_count().await.unwrap(), 1);

        let second = db.entities_for_article(article_id).await.unwrap();
        assert!(second.iter().all(|e| e.entity_type != EntityType::MilitaryUnit));

        let stored = db.get_article(article_id).await.unwrap().unwrap();
        let (expected, _) = pipeline.analyze(CIVIC_TEXT);
        assert_eq!(stored.content, CIVIC_TEXT);
        assert_eq!(stored.relevance_score, expected.relevance_score as i64);
        assert_eq!(stored.threat_level, expected.threat_level);
        assert_eq!(stored.detected_categories, expected.detected_categories);
    }

    #[tokio::test]
    async fn test_short_content_is_not_stored() {
        let db = Database::in_memory().await.unwrap();
        let pipeline = Pipeline::with_strategy(ScoringStrategy::Full);
        let content = "a".repeat(80);

        let outcome = pipeline
            .process_raw_article(&db, &raw("https://example.com/short", &content))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Skipped(ExtractionFailure::TooShort {
                length: 80,
                minimum: 100
            })
        );
        assert_eq!(db.article_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_high_threat_candidate_raises_one_alert() {
        let db = Database::in_memory().await.unwrap();
        let pipeline = Pipeline::with_strategy(ScoringStrategy::Full);
        let candidate = Candidate {
            title: "Border incident".to_string(),
            body_text: "A terrorist attack near the border triggered a security alert. Troops sealed the area while investigators collected evidence.".to_string(),
            url: "https://example.com/incident".to_string(),
            fetched_at: Utc::now(),
            source_domain: Some("example.com".to_string()),
            publication_date: None,
        };

        let outcome = pipeline.process_candidate(&db, &candidate).await.unwrap();
        let Outcome::Stored {
            article_id,
            threat_level,
        } = outcome
        else {
            panic!("candidate should be stored");
        };
        assert_eq!(threat_level, ThreatLevel::High);

        let alerts = db.alerts_for_article(article_id).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].alert_description.contains("security alert"));
    }

    #[tokio::test]
    async fn test_recompute_with_other_strategy() {
        let db = Database::in_memory().await.unwrap();
        let full = Pipeline::with_strategy(ScoringStrategy::Full);
        full.process_raw_article(&db, &raw("https://example.com/a", MILITARY_TEXT))
            .await
            .unwrap();
        full.process_raw_article(&db, &raw("https://example.com/b", CIVIC_TEXT))
            .await
            .unwrap();

        let quick = Pipeline::with_strategy(ScoringStrategy::Quick);
        let stats = quick.recompute_all(&db).await.unwrap();
        assert_eq!(
            stats,
            BatchStats {
                processed: 2,
                skipped: 0,
                errored: 0
            }
        );

        let stored = db.get_article_by_url("https://example.com/a").await.unwrap().unwrap();
        let (expected, _) = quick.analyze(MILITARY_TEXT);
        assert_eq!(stored.relevance_score, expected.relevance_score as i64);
        assert_eq!(stored.scraped_timestamp, "2026-04-01T08:00:00Z");
    }

    #[tokio::test]
    async fn test_process_directory_counts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            serde_json::to_string(&raw("https://example.com/a", MILITARY_TEXT)).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            serde_json::to_string(&raw("https://example.com/b", "too short")).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("c.json"), "[]").unwrap();

        let db = Database::in_memory().await.unwrap();
        let stats = Pipeline::with_strategy(ScoringStrategy::Full)
            .process_directory(&db, dir.path(), &ImportWindow::default())
            .await
            .unwrap();
        assert_eq!(
            stats,
            BatchStats {
                processed: 1,
                skipped: 1,
                errored: 1
            }
        );
    }
}
