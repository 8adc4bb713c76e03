use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, instrument};

use super::alert::write_alert;
use super::core::{Database, DbLockErrorExt};
use crate::classifier::{Classification, ThreatLevel};
use crate::entity::Entity;
use crate::extract::word_count;
use crate::TARGET_DB;

const MAX_LOCK_RETRIES: u32 = 5;
const INITIAL_BACKOFF_MS: u64 = 100;

/// Everything written to the `articles` row for one URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    pub content: String,
    pub scraped_timestamp: DateTime<Utc>,
    pub source_domain: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub threat_level: ThreatLevel,
    pub relevance_score: u32,
    pub detected_categories: Vec<String>,
    pub key_indicators: Vec<String>,
}

impl ArticleRecord {
    pub fn new(
        url: &str,
        title: &str,
        content: &str,
        scraped_timestamp: DateTime<Utc>,
        classification: &Classification,
    ) -> Self {
        ArticleRecord {
            url: url.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            scraped_timestamp,
            source_domain: None,
            publication_date: None,
            threat_level: classification.threat_level,
            relevance_score: classification.relevance_score,
            detected_categories: classification.detected_categories.clone(),
            key_indicators: classification.key_indicators.clone(),
        }
    }

    pub fn content_length(&self) -> i64 {
        self.content.chars().count() as i64
    }

    pub fn word_count(&self) -> i64 {
        word_count(&self.content) as i64
    }
}

/// An `articles` row as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub scraped_timestamp: String,
    pub content_length: i64,
    pub word_count: i64,
    pub threat_level: ThreatLevel,
    pub relevance_score: i64,
    pub detected_categories: Vec<String>,
    pub key_indicators: Vec<String>,
    pub source_domain: Option<String>,
    pub publication_date: Option<String>,
}

impl StoredArticle {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let threat_level: String = row.try_get("threat_level")?;
        let categories: String = row.try_get("detected_categories")?;
        let indicators: String = row.try_get("key_indicators")?;

        Ok(StoredArticle {
            id: row.try_get("id")?,
            url: row.try_get("url")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            scraped_timestamp: row.try_get("scraped_timestamp")?,
            content_length: row.try_get("content_length")?,
            word_count: row.try_get("word_count")?,
            threat_level: ThreatLevel::from(threat_level.as_str()),
            relevance_score: row.try_get("relevance_score")?,
            detected_categories: split_list(&categories),
            key_indicators: split_list(&indicators),
            source_domain: row.try_get("source_domain")?,
            publication_date: row.try_get("publication_date")?,
        })
    }
}

const ARTICLE_COLUMNS: &str = "id, url, title, content, scraped_timestamp, content_length, word_count, \
     threat_level, relevance_score, detected_categories, key_indicators, source_domain, publication_date";

/// Stored form of a timestamp; SQLite's date functions read it directly.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn join_list(items: &[String]) -> String {
    items.join(",")
}

pub(crate) fn split_list(stored: &str) -> Vec<String> {
    stored
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Database {
    /// Inserts or replaces the article keyed by URL, together with its
    /// entities and alert.
    ///
    /// The article id is stable across re-ingestion. Prior entities and
    /// alerts for the article are removed in the same transaction, so the
    /// stored state always reflects `article` and `entities` alone.
    #[instrument(target = "db_query", level = "debug", skip(self, article, entities), fields(url = %article.url))]
    pub async fn upsert_article(
        &self,
        article: &ArticleRecord,
        entities: &[Entity],
    ) -> Result<i64, sqlx::Error> {
        let mut backoff = INITIAL_BACKOFF_MS;

        for attempt in 1..=MAX_LOCK_RETRIES {
            match self.try_upsert_article(article, entities).await {
                Ok(id) => {
                    debug!(
                        target: TARGET_DB,
                        "Article stored: {} with id {} ({}, {} entities)",
                        article.url,
                        id,
                        article.threat_level,
                        entities.len()
                    );
                    return Ok(id);
                }
                Err(err) if err.is_database_lock_error() && attempt < MAX_LOCK_RETRIES => {
                    // Jitter keeps concurrent writers from retrying in lockstep.
                    let wait = backoff + rand::rng().random_range(0..200);
                    info!(
                        target: TARGET_DB,
                        "Database is locked, waiting {}ms before retrying attempt {}/{}: {}",
                        wait,
                        attempt + 1,
                        MAX_LOCK_RETRIES,
                        article.url
                    );
                    sleep(Duration::from_millis(wait)).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(err) => {
                    error!(target: TARGET_DB, "Failed to store article {}: {}", article.url, err);
                    return Err(err);
                }
            }
        }

        Err(sqlx::Error::Protocol(
            "Maximum retries exceeded for storing article".into(),
        ))
    }

    async fn try_upsert_article(
        &self,
        article: &ArticleRecord,
        entities: &[Entity],
    ) -> Result<i64, sqlx::Error> {
        let mut transaction = self.pool().begin().await?;

        let (id,) = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO articles (url, title, content, scraped_timestamp, content_length, word_count,
                                  threat_level, relevance_score, detected_categories, key_indicators,
                                  source_domain, publication_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                scraped_timestamp = excluded.scraped_timestamp,
                content_length = excluded.content_length,
                word_count = excluded.word_count,
                threat_level = excluded.threat_level,
                relevance_score = excluded.relevance_score,
                detected_categories = excluded.detected_categories,
                key_indicators = excluded.key_indicators,
                source_domain = COALESCE(excluded.source_domain, articles.source_domain),
                publication_date = COALESCE(excluded.publication_date, articles.publication_date)
            RETURNING id
            "#,
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.content)
        .bind(format_timestamp(&article.scraped_timestamp))
        .bind(article.content_length())
        .bind(article.word_count())
        .bind(article.threat_level.as_str())
        .bind(article.relevance_score as i64)
        .bind(join_list(&article.detected_categories))
        .bind(join_list(&article.key_indicators))
        .bind(&article.source_domain)
        .bind(article.publication_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .fetch_one(&mut *transaction)
        .await?;

        replace_entities(&mut transaction, id, entities).await?;
        write_alert(
            &mut transaction,
            id,
            article.threat_level,
            &article.key_indicators,
            &Utc::now(),
        )
        .await?;

        transaction.commit().await?;
        Ok(id)
    }

    pub async fn get_article_by_url(&self, url: &str) -> Result<Option<StoredArticle>, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT {} FROM articles WHERE url = ?1", ARTICLE_COLUMNS))
            .bind(url)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(StoredArticle::from_row).transpose()
    }

    pub async fn get_article(&self, id: i64) -> Result<Option<StoredArticle>, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT {} FROM articles WHERE id = ?1", ARTICLE_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(StoredArticle::from_row).transpose()
    }

    /// Every stored article in id order.
    pub async fn all_articles(&self) -> Result<Vec<StoredArticle>, sqlx::Error> {
        let rows = sqlx::query(&format!("SELECT {} FROM articles ORDER BY id", ARTICLE_COLUMNS))
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(StoredArticle::from_row).collect()
    }

    pub async fn article_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(self.pool())
            .await
    }
}

async fn replace_entities(
    conn: &mut SqliteConnection,
    article_id: i64,
    entities: &[Entity],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM entities WHERE article_id = ?1")
        .bind(article_id)
        .execute(&mut *conn)
        .await?;

    for entity in entities {
        sqlx::query(
            "INSERT INTO entities (article_id, text, type, entity_category) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(article_id)
        .bind(&entity.text)
        .bind(entity.entity_type.as_str())
        .bind(entity.category.as_str())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
