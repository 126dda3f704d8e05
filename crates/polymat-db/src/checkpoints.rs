//! Checkpoint/cursor store implementation.
//!
//! One physical row per `add_new` call. The monotonicity guard compares
//! the candidate against the maximum watermark over ALL rows matching
//! (name, table_name) — the context is deliberately not part of the
//! monotonicity key (see DESIGN.md open questions); it only narrows
//! `get_last`/`list_all` via JSON containment.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, error};

use polymat_core::{advance_allowed, Checkpoint, CheckpointRepository, Error, Result};

/// PostgreSQL implementation of [`CheckpointRepository`].
pub struct PgCheckpointRepository {
    pool: Pool<Postgres>,
}

impl PgCheckpointRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Checkpoint {
        Checkpoint {
            id: row.get("id"),
            name: row.get("name"),
            table_name: row.get("table_name"),
            row: row.get("row_id"),
            context: row.get("context"),
            created_at: row.get("created_at"),
        }
    }

    async fn max_watermark(&self, name: &str, table: &str) -> Result<Option<i64>> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(row_id) FROM checkpoints WHERE name = $1 AND table_name = $2",
        )
        .bind(name)
        .bind(table)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(max)
    }
}

#[async_trait]
impl CheckpointRepository for PgCheckpointRepository {
    async fn get_last(&self, name: &str, table: &str, context: &JsonValue) -> Result<i64> {
        let last: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(row_id) FROM checkpoints
             WHERE name = $1 AND table_name = $2 AND context @> $3",
        )
        .bind(name)
        .bind(table)
        .bind(context)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(last.unwrap_or(0))
    }

    async fn add_new(
        &self,
        name: &str,
        table: &str,
        row: i64,
        context: &JsonValue,
    ) -> Result<bool> {
        let existing = self.max_watermark(name, table).await?;
        if !advance_allowed(existing, row) {
            error!(
                subsystem = "db",
                component = "checkpoint",
                checkpoint = name,
                db_table = table,
                watermark = row,
                existing = existing.unwrap_or(0),
                "Checkpoint write rejected: candidate below existing watermark"
            );
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO checkpoints (name, table_name, row_id, context)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(name)
        .bind(table)
        .bind(row)
        .bind(context)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "checkpoint",
            checkpoint = name,
            db_table = table,
            watermark = row,
            "Checkpoint advanced"
        );
        Ok(true)
    }

    async fn list_all(
        &self,
        name: &str,
        table: &str,
        context: &JsonValue,
    ) -> Result<Vec<Checkpoint>> {
        let rows = sqlx::query(
            "SELECT * FROM checkpoints
             WHERE name = $1 AND table_name = $2 AND context @> $3
             ORDER BY id DESC",
        )
        .bind(name)
        .bind(table)
        .bind(context)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(Self::parse_row).collect())
    }
}
