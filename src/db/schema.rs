use tracing::info;

use super::core::Database;
use crate::TARGET_DB;

impl Database {
    pub(crate) async fn initialize_schema(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.pool().acquire().await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                scraped_timestamp TEXT NOT NULL,
                content_length INTEGER NOT NULL,
                word_count INTEGER NOT NULL,
                threat_level TEXT NOT NULL DEFAULT 'LOW', -- LOW, MEDIUM, HIGH
                relevance_score INTEGER NOT NULL DEFAULT 0,
                detected_categories TEXT NOT NULL DEFAULT '', -- comma separated
                key_indicators TEXT NOT NULL DEFAULT '', -- comma separated
                source_domain TEXT,
                publication_date TEXT -- YYYY-MM-DD
            );
            CREATE INDEX IF NOT EXISTS idx_articles_threat_level ON articles (threat_level);
            CREATE INDEX IF NOT EXISTS idx_articles_scraped_timestamp ON articles (scraped_timestamp);

            CREATE TABLE IF NOT EXISTS entities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                text TEXT NOT NULL,
                type TEXT NOT NULL, -- PERSON, ORG, LOCATION, MILITARY_UNIT, WEAPON
                entity_category TEXT NOT NULL DEFAULT 'STANDARD', -- STANDARD, DEFENSE
                FOREIGN KEY (article_id) REFERENCES articles (id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_entities_article_id ON entities (article_id);
            CREATE INDEX IF NOT EXISTS idx_entities_type ON entities (type, entity_category);

            CREATE TABLE IF NOT EXISTS defense_alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                alert_type TEXT NOT NULL,
                alert_level TEXT NOT NULL,
                alert_description TEXT NOT NULL,
                created_timestamp TEXT NOT NULL,
                FOREIGN KEY (article_id) REFERENCES articles (id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_defense_alerts_article_id ON defense_alerts (article_id);
            CREATE INDEX IF NOT EXISTS idx_defense_alerts_created ON defense_alerts (created_timestamp);
            "#,
        )
        .execute(&mut *conn)
        .await?;

        info!(target: TARGET_DB, "Database schema initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        db.initialize_schema().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(tables, vec!["articles", "defense_alerts", "entities"]);
    }
}
