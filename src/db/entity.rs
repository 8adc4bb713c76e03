use serde::{Deserialize, Serialize};
use sqlx::Row;

use super::core::Database;
use crate::entity::{Entity, EntityCategory, EntityType};

/// Number of stored entity rows of one type and category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCount {
    pub entity_type: EntityType,
    pub category: EntityCategory,
    pub count: i64,
}

impl Database {
    /// Entities currently attached to an article, sorted by type then text.
    pub async fn entities_for_article(&self, article_id: i64) -> Result<Vec<Entity>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT text, type, entity_category FROM entities WHERE article_id = ?1 ORDER BY type, text",
        )
        .bind(article_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let entity_type: String = row.try_get("type")?;
                let category: String = row.try_get("entity_category")?;
                Ok(Entity {
                    text: row.try_get("text")?,
                    entity_type: EntityType::from(entity_type.as_str()),
                    category: EntityCategory::from(category.as_str()),
                })
            })
            .collect()
    }

    /// Entity rows grouped by type and category, largest group first.
    pub async fn entity_counts(&self) -> Result<Vec<EntityCount>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT type, entity_category, COUNT(*) AS count
            FROM entities
            GROUP BY type, entity_category
            ORDER BY count DESC, type
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let entity_type: String = row.try_get("type")?;
                let category: String = row.try_get("entity_category")?;
                Ok(EntityCount {
                    entity_type: EntityType::from(entity_type.as_str()),
                    category: EntityCategory::from(category.as_str()),
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }

    /// Most frequently mentioned entity texts of one type.
    pub async fn top_entities(
        &self,
        entity_type: EntityType,
        limit: i64,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT text, COUNT(*) AS mentions
            FROM entities
            WHERE type = ?1
            GROUP BY text
            ORDER BY mentions DESC, text
            LIMIT ?2
            "#,
        )
        .bind(entity_type.as_str())
        .bind(limit)
        .fetch_all(self.pool())
        .await
    }
}
