use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection};
use tracing::{debug, instrument};

use super::article::format_timestamp;
use super::core::Database;
use crate::classifier::ThreatLevel;
use crate::TARGET_DB;

pub const ALERT_TYPE_THREAT_DETECTION: &str = "THREAT_DETECTION";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: i64,
    pub article_id: i64,
    pub alert_type: String,
    pub alert_level: ThreatLevel,
    pub alert_description: String,
    pub created_timestamp: String,
}

/// An alert joined with the article that raised it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentAlert {
    pub alert_id: i64,
    pub article_id: i64,
    pub alert_level: ThreatLevel,
    pub alert_description: String,
    pub created_timestamp: String,
    pub title: String,
    pub url: String,
    pub relevance_score: i64,
}

/// Human-readable summary stored with an alert.
pub fn alert_description(level: ThreatLevel, key_indicators: &[String]) -> String {
    let mut description = format!(
        "Article contains {}-level security content",
        level.as_str().to_lowercase()
    );
    if !key_indicators.is_empty() {
        description.push_str(". Key indicators: ");
        description.push_str(&key_indicators.join(", "));
    }
    description
}

/// Clears the article's alerts and writes a fresh one when `level` warrants it.
pub(crate) async fn write_alert(
    conn: &mut SqliteConnection,
    article_id: i64,
    level: ThreatLevel,
    key_indicators: &[String],
    now: &DateTime<Utc>,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query("DELETE FROM defense_alerts WHERE article_id = ?1")
        .bind(article_id)
        .execute(&mut *conn)
        .await?;

    if !level.raises_alert() {
        return Ok(None);
    }

    let (id,) = sqlx::query_as::<_, (i64,)>(
        r#"
        INSERT INTO defense_alerts (article_id, alert_type, alert_level, alert_description, created_timestamp)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id
        "#,
    )
    .bind(article_id)
    .bind(ALERT_TYPE_THREAT_DETECTION)
    .bind(level.as_str())
    .bind(alert_description(level, key_indicators))
    .bind(format_timestamp(now))
    .fetch_one(&mut *conn)
    .await?;

    debug!(target: TARGET_DB, "{} alert {} raised for article {}", level, id, article_id);
    Ok(Some(id))
}

impl Database {
    /// Re-derives the alert for an already stored article.
    #[instrument(target = "db_query", level = "debug", skip(self, key_indicators))]
    pub async fn derive_alert(
        &self,
        article_id: i64,
        level: ThreatLevel,
        key_indicators: &[String],
    ) -> Result<Option<i64>, sqlx::Error> {
        let mut transaction = self.pool().begin().await?;
        let id = write_alert(&mut transaction, article_id, level, key_indicators, &Utc::now()).await?;
        transaction.commit().await?;
        Ok(id)
    }

    pub async fn alerts_for_article(&self, article_id: i64) -> Result<Vec<AlertRecord>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, article_id, alert_type, alert_level, alert_description, created_timestamp
            FROM defense_alerts
            WHERE article_id = ?1
            ORDER BY id
            "#,
        )
        .bind(article_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let level: String = row.try_get("alert_level")?;
                Ok(AlertRecord {
                    id: row.try_get("id")?,
                    article_id: row.try_get("article_id")?,
                    alert_type: row.try_get("alert_type")?,
                    alert_level: ThreatLevel::from(level.as_str()),
                    alert_description: row.try_get("alert_description")?,
                    created_timestamp: row.try_get("created_timestamp")?,
                })
            })
            .collect()
    }

    /// The `limit` newest alerts with their article.
    pub async fn recent_alerts(&self, limit: i64) -> Result<Vec<RecentAlert>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT a.id AS alert_id, a.article_id, a.alert_level, a.alert_description, a.created_timestamp,
                   ar.title, ar.url, ar.relevance_score
            FROM defense_alerts a
            JOIN articles ar ON a.article_id = ar.id
            ORDER BY datetime(a.created_timestamp) DESC, a.id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let level: String = row.try_get("alert_level")?;
                Ok(RecentAlert {
                    alert_id: row.try_get("alert_id")?,
                    article_id: row.try_get("article_id")?,
                    alert_level: ThreatLevel::from(level.as_str()),
                    alert_description: row.try_get("alert_description")?,
                    created_timestamp: row.try_get("created_timestamp")?,
                    title: row.try_get("title")?,
                    url: row.try_get("url")?,
                    relevance_score: row.try_get("relevance_score")?,
                })
            })
            .collect()
    }

    /// Alerts created in the 24 hours before `now`.
    pub async fn alerts_last_day(&self, now: &DateTime<Utc>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM defense_alerts WHERE datetime(created_timestamp) >= datetime(?1, '-1 day')",
        )
        .bind(format_timestamp(now))
        .fetch_one(self.pool())
        .await
    }
}
