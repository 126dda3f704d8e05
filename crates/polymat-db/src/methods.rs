//! Extraction method repository implementation.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};

use polymat_core::{ApiKind, Error, ExtractionMethod, MethodParams, MethodRepository, Result};

/// PostgreSQL implementation of [`MethodRepository`].
///
/// Parameter defaulting happens here, once per load; reading a parameter
/// downstream never mutates the stored definition.
pub struct PgMethodRepository {
    pool: Pool<Postgres>,
}

impl PgMethodRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Result<ExtractionMethod> {
        let params: JsonValue = row.get("params");
        Ok(ExtractionMethod {
            id: row.get("id"),
            name: row.get("name"),
            model: row.get("model"),
            api: ApiKind::parse(row.get("api"))?,
            params: MethodParams::from_json(&params)?,
        })
    }
}

#[async_trait]
impl MethodRepository for PgMethodRepository {
    async fn get_by_name(&self, name: &str) -> Result<Option<ExtractionMethod>> {
        let row = sqlx::query("SELECT * FROM methods WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.map(Self::parse_row).transpose()
    }
}
