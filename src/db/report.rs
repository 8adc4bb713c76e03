//! Read-only aggregates for reporting and dashboards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::alert::RecentAlert;
use super::article::format_timestamp;
use super::core::Database;
use super::entity::EntityCount;
use crate::classifier::ThreatLevel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatDistribution {
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

impl ThreatDistribution {
    pub fn total(&self) -> i64 {
        self.high + self.medium + self.low
    }

    pub fn get(&self, level: ThreatLevel) -> i64 {
        match level {
            ThreatLevel::High => self.high,
            ThreatLevel::Medium => self.medium,
            ThreatLevel::Low => self.low,
        }
    }
}

/// Articles scraped within fixed windows ending at a reference time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCounts {
    pub last_hour: i64,
    pub last_day: i64,
    pub last_30_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceReport {
    pub generated_at: String,
    pub total_articles: i64,
    pub threat_distribution: ThreatDistribution,
    pub window_counts: WindowCounts,
    pub alerts_last_day: i64,
    pub recent_alerts: Vec<RecentAlert>,
    pub entity_counts: Vec<EntityCount>,
}

impl Database {
    pub async fn threat_distribution(&self) -> Result<ThreatDistribution, sqlx::Error> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT threat_level, COUNT(*) FROM articles GROUP BY threat_level",
        )
        .fetch_all(self.pool())
        .await?;

        let mut distribution = ThreatDistribution::default();
        for (level, count) in rows {
            match ThreatLevel::from(level.as_str()) {
                ThreatLevel::High => distribution.high += count,
                ThreatLevel::Medium => distribution.medium += count,
                ThreatLevel::Low => distribution.low += count,
            }
        }
        Ok(distribution)
    }

    pub async fn window_counts(&self, now: &DateTime<Utc>) -> Result<WindowCounts, sqlx::Error> {
        let (last_hour, last_day, last_30_days) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                COALESCE(SUM(datetime(scraped_timestamp) >= datetime(?1, '-1 hour')), 0),
                COALESCE(SUM(datetime(scraped_timestamp) >= datetime(?1, '-1 day')), 0),
                COALESCE(SUM(datetime(scraped_timestamp) >= datetime(?1, '-30 days')), 0)
            FROM articles
            WHERE datetime(scraped_timestamp) <= datetime(?1)
            "#,
        )
        .bind(format_timestamp(now))
        .fetch_one(self.pool())
        .await?;

        Ok(WindowCounts {
            last_hour,
            last_day,
            last_30_days,
        })
    }

    /// Everything a report or dashboard needs, as of `now`.
    #[instrument(target = "db_query", level = "debug", skip(self))]
    pub async fn report(
        &self,
        now: &DateTime<Utc>,
        recent_alerts_limit: i64,
    ) -> Result<IntelligenceReport, sqlx::Error> {
        Ok(IntelligenceReport {
            generated_at: format_timestamp(now),
            total_articles: self.article_count().await?,
            threat_distribution: self.threat_distribution().await?,
            window_counts: self.window_counts(now).await?,
            alerts_last_day: self.alerts_last_day(now).await?,
            recent_alerts: self.recent_alerts(recent_alerts_limit).await?,
            entity_counts: self.entity_counts().await?,
        })
    }
}
