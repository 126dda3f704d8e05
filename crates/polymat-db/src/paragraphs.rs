//! Paragraph repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use polymat_core::{Error, Paragraph, ParagraphRepository, Result};

/// PostgreSQL implementation of [`ParagraphRepository`].
pub struct PgParagraphRepository {
    pool: Pool<Postgres>,
}

impl PgParagraphRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Paragraph {
        Paragraph {
            id: row.get("id"),
            paper_id: row.get("paper_id"),
            doi: row.get("doi"),
            text: row.get("text"),
            source: row.get("source"),
        }
    }
}

#[async_trait]
impl ParagraphRepository for PgParagraphRepository {
    async fn insert(&self, paper_id: i64, doi: &str, text: &str, source: &str) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO paragraphs (paper_id, doi, text, source)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(paper_id)
        .bind(doi)
        .bind(text)
        .bind(source)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }

    async fn fetch(&self, id: i64) -> Result<Paragraph> {
        let row = sqlx::query("SELECT * FROM paragraphs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.map(Self::parse_row)
            .ok_or(Error::ParagraphNotFound(id))
    }

    async fn fetch_after(
        &self,
        after: i64,
        limit: i64,
        source: Option<&str>,
    ) -> Result<Vec<Paragraph>> {
        let rows = sqlx::query(
            "SELECT * FROM paragraphs
             WHERE id > $1 AND ($3::text IS NULL OR source = $3)
             ORDER BY id ASC
             LIMIT $2",
        )
        .bind(after)
        .bind(limit)
        .bind(source)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM paragraphs")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
