//! Cross-reference pair repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use polymat_core::{CrossrefPair, CrossrefRepository, Error, Result};

/// PostgreSQL implementation of [`CrossrefRepository`].
pub struct PgCrossrefRepository {
    pool: Pool<Postgres>,
}

impl PgCrossrefRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrossrefRepository for PgCrossrefRepository {
    async fn list_for_paragraph(&self, paragraph_id: i64) -> Result<Vec<CrossrefPair>> {
        // Pairs from every paragraph of the same paper: an abbreviation
        // defined in the introduction resolves in later paragraphs.
        let rows = sqlx::query(
            "SELECT c.paragraph_id, c.abbr, c.full_form
             FROM crossrefs c
             JOIN paragraphs p ON p.id = c.paragraph_id
             WHERE p.paper_id = (SELECT paper_id FROM paragraphs WHERE id = $1)
             ORDER BY c.id ASC",
        )
        .bind(paragraph_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| CrossrefPair {
                paragraph_id: row.get("paragraph_id"),
                abbr: row.get("abbr"),
                full_form: row.get("full_form"),
            })
            .collect())
    }

    async fn insert(&self, pair: &CrossrefPair) -> Result<()> {
        sqlx::query(
            "INSERT INTO crossrefs (paragraph_id, abbr, full_form)
             VALUES ($1, $2, $3)
             ON CONFLICT (paragraph_id, abbr) DO NOTHING",
        )
        .bind(pair.paragraph_id)
        .bind(&pair.abbr)
        .bind(&pair.full_form)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}
