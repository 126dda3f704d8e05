//! Property metadata repository implementation.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};

use polymat_core::{Error, PropertyMetadata, PropertyRepository, Result};

/// PostgreSQL implementation of [`PropertyRepository`].
pub struct PgPropertyRepository {
    pool: Pool<Postgres>,
}

impl PgPropertyRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Result<PropertyMetadata> {
        let synonyms: JsonValue = row.get("synonyms");
        let units: JsonValue = row.get("units");
        Ok(PropertyMetadata {
            id: row.get("id"),
            name: row.get("name"),
            synonyms: serde_json::from_value(synonyms)?,
            units: serde_json::from_value(units)?,
            lower_limit: row.get("lower_limit"),
            upper_limit: row.get("upper_limit"),
            percent_scale: row.get("percent_scale"),
        })
    }
}

#[async_trait]
impl PropertyRepository for PgPropertyRepository {
    async fn get_by_name(&self, name: &str) -> Result<Option<PropertyMetadata>> {
        let row = sqlx::query("SELECT * FROM properties WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.map(Self::parse_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<PropertyMetadata>> {
        let rows = sqlx::query("SELECT * FROM properties ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        rows.into_iter().map(Self::parse_row).collect()
    }
}
