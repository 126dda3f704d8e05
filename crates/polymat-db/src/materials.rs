//! Material mention repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use polymat_core::{Error, MaterialMention, MaterialRepository, Result};

/// PostgreSQL implementation of [`MaterialRepository`].
pub struct PgMaterialRepository {
    pool: Pool<Postgres>,
}

impl PgMaterialRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MaterialRepository for PgMaterialRepository {
    async fn find_or_insert(
        &self,
        paragraph_id: i64,
        method_id: i64,
        mention: &MaterialMention,
    ) -> Result<i64> {
        // Uniqueness-check-before-insert: return the existing row id when
        // (paragraph, method, entity_name) is already present.
        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM materials
             WHERE paragraph_id = $1 AND method_id = $2 AND entity_name = $3",
        )
        .bind(paragraph_id)
        .bind(method_id)
        .bind(&mention.entity_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO materials
                (paragraph_id, method_id, entity_name, material_class, polymer_type,
                 normalized_name, coreferents, components, role)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (paragraph_id, method_id, entity_name) DO UPDATE
                 SET normalized_name = EXCLUDED.normalized_name
             RETURNING id",
        )
        .bind(paragraph_id)
        .bind(method_id)
        .bind(&mention.entity_name)
        .bind(mention.material_class.as_str())
        .bind(mention.polymer_type.as_str())
        .bind(&mention.normalized_name)
        .bind(serde_json::to_value(&mention.coreferents)?)
        .bind(serde_json::to_value(&mention.components)?)
        .bind(&mention.role)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn delete_by_method(&self, method_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM materials WHERE method_id = $1")
            .bind(method_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}
