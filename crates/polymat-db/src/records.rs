//! Extracted property record repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::trace;

use polymat_core::{
    Error, MaterialClass, PropertyValuePair, RecordRepository, RecordRow, Result,
};

/// PostgreSQL implementation of [`RecordRepository`].
pub struct PgRecordRepository {
    pool: Pool<Postgres>,
}

impl PgRecordRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_validation_row(row: sqlx::postgres::PgRow) -> RecordRow {
        RecordRow {
            id: row.get("id"),
            method_id: row.get("method_id"),
            material_id: row.get("material_id"),
            paragraph_id: row.get("paragraph_id"),
            entity_name: row.get("entity_name"),
            numeric_value: row.get("numeric_value"),
            unit: row.get("unit"),
            material_class: MaterialClass::from_str(row.get("material_class")),
            paragraph_text: row.get("paragraph_text"),
        }
    }
}

#[async_trait]
impl RecordRepository for PgRecordRepository {
    async fn insert_deduplicated(
        &self,
        method_id: i64,
        material_id: i64,
        paragraph_id: i64,
        pair: &PropertyValuePair,
    ) -> Result<(i64, bool)> {
        // A record without a numeric value must never be persisted.
        let Some(numeric_value) = pair.numeric_value else {
            return Err(Error::InvalidInput(format!(
                "record {:?} has no numeric value",
                pair.entity_name
            )));
        };

        // Atomic check-and-insert on the deduplication key
        // (method, material, entity_name, numeric_value); a second insert
        // of the same key is a no-op returning the existing id.
        let inserted: Option<i64> = sqlx::query_scalar(
            "INSERT INTO records
                (method_id, material_id, paragraph_id, entity_name, raw_value,
                 numeric_value, numeric_error, value_average, value_descriptor,
                 unit, conditions)
             SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
             WHERE NOT EXISTS (
                 SELECT 1 FROM records
                 WHERE method_id = $1 AND material_id = $2
                   AND entity_name = $4 AND numeric_value = $6
             )
             RETURNING id",
        )
        .bind(method_id)
        .bind(material_id)
        .bind(paragraph_id)
        .bind(&pair.entity_name)
        .bind(&pair.raw_value)
        .bind(numeric_value)
        .bind(pair.numeric_error)
        .bind(pair.value_average)
        .bind(&pair.value_descriptor)
        .bind(&pair.unit)
        .bind(&pair.conditions)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        if let Some(id) = inserted {
            trace!(record_id = id, "record inserted");
            return Ok((id, true));
        }

        let existing: i64 = sqlx::query_scalar(
            "SELECT id FROM records
             WHERE method_id = $1 AND material_id = $2
               AND entity_name = $3 AND numeric_value = $4",
        )
        .bind(method_id)
        .bind(material_id)
        .bind(&pair.entity_name)
        .bind(numeric_value)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok((existing, false))
    }

    async fn fetch_for_validation(
        &self,
        method_id: i64,
        after: i64,
        limit: i64,
        upstream_filter: Option<&str>,
    ) -> Result<Vec<RecordRow>> {
        let rows = sqlx::query(
            "SELECT r.id, r.method_id, r.material_id, r.paragraph_id, r.entity_name,
                    r.numeric_value, r.unit, m.material_class, p.text AS paragraph_text
             FROM records r
             JOIN materials m ON m.id = r.material_id
             JOIN paragraphs p ON p.id = r.paragraph_id
             WHERE r.method_id = $1 AND r.id > $2
               AND ($4::text IS NULL OR EXISTS (
                   SELECT 1 FROM filtered_data f
                   WHERE f.table_name = 'records'
                     AND f.table_row = r.id
                     AND f.filter_name = $4
               ))
             ORDER BY r.id ASC
             LIMIT $3",
        )
        .bind(method_id)
        .bind(after)
        .bind(limit)
        .bind(upstream_filter)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_validation_row).collect())
    }

    async fn delete_by_method(&self, method_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM records WHERE method_id = $1")
            .bind(method_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }

    async fn count_by_method(&self, method_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE method_id = $1")
            .bind(method_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
