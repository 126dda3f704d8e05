//! Validator marker repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use polymat_core::{Error, FilteredDataRepository, FilteredRow, Result};

/// PostgreSQL implementation of [`FilteredDataRepository`].
///
/// Markers are append-only; nothing here mutates or deletes the rows a
/// marker points at.
pub struct PgFilteredDataRepository {
    pool: Pool<Postgres>,
}

impl PgFilteredDataRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FilteredDataRepository for PgFilteredDataRepository {
    async fn add(&self, row: &FilteredRow) -> Result<()> {
        sqlx::query(
            "INSERT INTO filtered_data (table_name, table_row, filter_on, filter_name)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (table_name, table_row, filter_on, filter_name) DO NOTHING",
        )
        .bind(&row.table_name)
        .bind(row.table_row)
        .bind(&row.filter_on)
        .bind(&row.filter_name)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn exists(&self, table: &str, table_row: i64, filter_name: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM filtered_data
             WHERE table_name = $1 AND table_row = $2 AND filter_name = $3
             LIMIT 1",
        )
        .bind(table)
        .bind(table_row)
        .bind(filter_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(found.is_some())
    }

    async fn count_by_filter(&self, filter_name: &str) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM filtered_data WHERE filter_name = $1")
            .bind(filter_name)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn delete_by_filter(&self, filter_name: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM filtered_data WHERE filter_name = $1")
            .bind(filter_name)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}
