//! Logical schema setup.
//!
//! Migration tooling is out of scope for this crate; deployments run
//! their own migration flow. `ensure_schema` brings a fresh database (or
//! a test schema) to the logical layout the repositories expect.

use sqlx::PgPool;

use polymat_core::{Error, Result};

const SCHEMA_SQL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS paragraphs (
        id BIGSERIAL PRIMARY KEY,
        paper_id BIGINT NOT NULL,
        doi TEXT NOT NULL,
        text TEXT NOT NULL,
        source TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS methods (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        model TEXT NOT NULL,
        api TEXT NOT NULL,
        params JSONB NOT NULL DEFAULT '{}'::jsonb
    )",
    "CREATE TABLE IF NOT EXISTS properties (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        synonyms JSONB NOT NULL DEFAULT '[]'::jsonb,
        units JSONB NOT NULL DEFAULT '[]'::jsonb,
        lower_limit DOUBLE PRECISION NOT NULL DEFAULT '-Infinity',
        upper_limit DOUBLE PRECISION NOT NULL DEFAULT 'Infinity',
        percent_scale BOOLEAN NOT NULL DEFAULT FALSE
    )",
    "CREATE TABLE IF NOT EXISTS materials (
        id BIGSERIAL PRIMARY KEY,
        paragraph_id BIGINT NOT NULL REFERENCES paragraphs(id),
        method_id BIGINT NOT NULL REFERENCES methods(id),
        entity_name TEXT NOT NULL,
        material_class TEXT NOT NULL DEFAULT '',
        polymer_type TEXT NOT NULL DEFAULT 'homopolymer',
        normalized_name TEXT NOT NULL,
        coreferents JSONB NOT NULL DEFAULT '[]'::jsonb,
        components JSONB NOT NULL DEFAULT '[]'::jsonb,
        role TEXT,
        UNIQUE (paragraph_id, method_id, entity_name)
    )",
    "CREATE TABLE IF NOT EXISTS records (
        id BIGSERIAL PRIMARY KEY,
        method_id BIGINT NOT NULL REFERENCES methods(id),
        material_id BIGINT NOT NULL REFERENCES materials(id),
        paragraph_id BIGINT NOT NULL REFERENCES paragraphs(id),
        entity_name TEXT NOT NULL,
        raw_value TEXT NOT NULL DEFAULT '',
        numeric_value DOUBLE PRECISION NOT NULL,
        numeric_error DOUBLE PRECISION,
        value_average BOOLEAN NOT NULL DEFAULT FALSE,
        value_descriptor TEXT NOT NULL DEFAULT '',
        unit TEXT NOT NULL DEFAULT '',
        conditions TEXT NOT NULL DEFAULT ''
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS records_dedup_idx
        ON records (method_id, material_id, entity_name, numeric_value)",
    "CREATE TABLE IF NOT EXISTS checkpoints (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        table_name TEXT NOT NULL,
        row_id BIGINT NOT NULL,
        context JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS checkpoints_name_table_idx
        ON checkpoints (name, table_name)",
    "CREATE TABLE IF NOT EXISTS filtered_data (
        id BIGSERIAL PRIMARY KEY,
        table_name TEXT NOT NULL,
        table_row BIGINT NOT NULL,
        filter_on TEXT NOT NULL,
        filter_name TEXT NOT NULL,
        UNIQUE (table_name, table_row, filter_on, filter_name)
    )",
    "CREATE TABLE IF NOT EXISTS crossrefs (
        id BIGSERIAL PRIMARY KEY,
        paragraph_id BIGINT NOT NULL REFERENCES paragraphs(id),
        abbr TEXT NOT NULL,
        full_form TEXT NOT NULL,
        UNIQUE (paragraph_id, abbr)
    )",
];

/// Create any missing tables and indexes.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA_SQL {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }
    Ok(())
}
