//! Test fixtures for database integration tests.
//!
//! Provides reusable setup and seed helpers for consistent testing.
//!
//! ## Configuration
//!
//! Integration tests connect to `POLYMAT_TEST_DATABASE_URL`. When the
//! variable is unset, tests call [`test_database_url`] and skip
//! themselves, so the suite passes on machines without a test database.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use polymat_db::test_fixtures::{test_database_url, TestDatabase};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let Some(url) = test_database_url() else { return };
//!     let test_db = TestDatabase::connect(&url).await;
//!     // Run your tests...
//!     test_db.cleanup().await;
//! }
//! ```

use serde_json::json;
use sqlx::PgPool;

use crate::pool::{create_pool_with_config, PoolConfig};
use crate::schema::ensure_schema;
use crate::Database;

/// Test database URL, `None` when integration tests should skip.
pub fn test_database_url() -> Option<String> {
    std::env::var("POLYMAT_TEST_DATABASE_URL").ok()
}

/// Test database connection with schema setup and cleanup helpers.
pub struct TestDatabase {
    pub pool: PgPool,
    pub db: Database,
}

impl TestDatabase {
    /// Connect and ensure the schema exists.
    pub async fn connect(url: &str) -> Self {
        let config = PoolConfig::default().max_connections(5);
        let pool = create_pool_with_config(url, config)
            .await
            .expect("test database connection");
        ensure_schema(&pool).await.expect("schema setup");
        let db = Database::from_pool(pool.clone());
        Self { pool, db }
    }

    /// Truncate every polymat table.
    pub async fn cleanup(&self) {
        for table in [
            "filtered_data",
            "checkpoints",
            "crossrefs",
            "records",
            "materials",
            "properties",
            "methods",
            "paragraphs",
        ] {
            sqlx::query(&format!("TRUNCATE {table} RESTART IDENTITY CASCADE"))
                .execute(&self.pool)
                .await
                .expect("truncate");
        }
    }

    /// Seed an extraction method, returning its id.
    pub async fn seed_method(&self, name: &str, api: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO methods (name, model, api, params)
             VALUES ($1, 'test-model', $2, '{}'::jsonb)
             RETURNING id",
        )
        .bind(name)
        .bind(api)
        .fetch_one(&self.pool)
        .await
        .expect("seed method")
    }

    /// Seed a paragraph, returning its id.
    pub async fn seed_paragraph(&self, doi: &str, text: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO paragraphs (paper_id, doi, text, source)
             VALUES (1, $1, $2, 'test')
             RETURNING id",
        )
        .bind(doi)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .expect("seed paragraph")
    }

    /// Seed property metadata, returning its id.
    pub async fn seed_property(
        &self,
        name: &str,
        synonyms: &[&str],
        units: &[&str],
        lower: f64,
        upper: f64,
    ) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO properties (name, synonyms, units, lower_limit, upper_limit)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(name)
        .bind(json!(synonyms))
        .bind(json!(units))
        .bind(lower)
        .bind(upper)
        .fetch_one(&self.pool)
        .await
        .expect("seed property")
    }
}
