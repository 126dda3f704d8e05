//! Core repository traits for polymat abstractions.
//!
//! These traits define the storage interfaces the pipelines depend on,
//! enabling Postgres implementations in `polymat-db` and in-memory doubles
//! in tests. Connections are owned by the implementations; no component
//! reaches for global session state.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::method::ExtractionMethod;
use crate::models::*;

/// Repository for immutable source paragraphs.
#[async_trait]
pub trait ParagraphRepository: Send + Sync {
    /// Insert a paragraph at ingestion time, returning its id.
    async fn insert(&self, paper_id: i64, doi: &str, text: &str, source: &str) -> Result<i64>;

    /// Fetch a paragraph by id.
    async fn fetch(&self, id: i64) -> Result<Paragraph>;

    /// Fetch up to `limit` paragraphs with id greater than `after`,
    /// ordered by id ascending, optionally restricted to one source tag.
    async fn fetch_after(
        &self,
        after: i64,
        limit: i64,
        source: Option<&str>,
    ) -> Result<Vec<Paragraph>>;

    /// Total paragraph count.
    async fn count(&self) -> Result<i64>;
}

/// Repository for material mentions.
#[async_trait]
pub trait MaterialRepository: Send + Sync {
    /// Insert a mention unless one already exists for
    /// (paragraph_id, method_id, entity_name); returns the row id either
    /// way.
    async fn find_or_insert(
        &self,
        paragraph_id: i64,
        method_id: i64,
        mention: &MaterialMention,
    ) -> Result<i64>;

    /// Delete all mentions produced by a method (used by `remove` reruns).
    async fn delete_by_method(&self, method_id: i64) -> Result<u64>;
}

/// Repository for extracted property records.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Insert a record unless one already exists for the deduplication key
    /// (method_id, material_id, entity_name, numeric_value). Returns the
    /// row id and whether a new row was created.
    async fn insert_deduplicated(
        &self,
        method_id: i64,
        material_id: i64,
        paragraph_id: i64,
        pair: &PropertyValuePair,
    ) -> Result<(i64, bool)>;

    /// Fetch candidate rows for a validator: records of `method_id` with
    /// id greater than `after`, ordered ascending, joined with material
    /// class and paragraph text. When `upstream_filter` is set, restrict
    /// to rows already marked under that filter name.
    async fn fetch_for_validation(
        &self,
        method_id: i64,
        after: i64,
        limit: i64,
        upstream_filter: Option<&str>,
    ) -> Result<Vec<RecordRow>>;

    /// Delete all records produced by a method (used by `remove` reruns).
    async fn delete_by_method(&self, method_id: i64) -> Result<u64>;

    /// Count records produced by a method.
    async fn count_by_method(&self, method_id: i64) -> Result<i64>;
}

/// Repository for per-property validation metadata.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Fetch metadata by canonical property name, `None` when absent.
    /// Callers treat absence for a configured property as fatal.
    async fn get_by_name(&self, name: &str) -> Result<Option<PropertyMetadata>>;

    /// List all known properties.
    async fn list_all(&self) -> Result<Vec<PropertyMetadata>>;
}

/// Repository for extraction method definitions.
#[async_trait]
pub trait MethodRepository: Send + Sync {
    /// Fetch a method by name, `None` when absent. Callers treat absence
    /// as fatal configuration error.
    async fn get_by_name(&self, name: &str) -> Result<Option<ExtractionMethod>>;
}

/// Durable "last processed row id" store.
///
/// Monotonicity contract: for a given (name, table_name) the stored `row`
/// is non-decreasing across ALL contexts; an attempt to persist a smaller
/// value is rejected with `Ok(false)` and an error log, never an `Err`.
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Last checkpointed row id matching (name, table, context), 0 if
    /// none. `context` entries narrow the match via containment.
    async fn get_last(&self, name: &str, table: &str, context: &JsonValue) -> Result<i64>;

    /// Persist a new checkpoint row. Returns false (and logs an error)
    /// when `row` is below an existing watermark for (name, table).
    async fn add_new(&self, name: &str, table: &str, row: i64, context: &JsonValue)
        -> Result<bool>;

    /// All checkpoint rows matching (name, table, context), newest first.
    async fn list_all(&self, name: &str, table: &str, context: &JsonValue)
        -> Result<Vec<Checkpoint>>;
}

/// Append-only store of validator markers.
#[async_trait]
pub trait FilteredDataRepository: Send + Sync {
    /// Append a marker. Re-adding an identical marker is a no-op.
    async fn add(&self, row: &FilteredRow) -> Result<()>;

    /// Whether a marker exists for (table, row, filter_name).
    async fn exists(&self, table: &str, table_row: i64, filter_name: &str) -> Result<bool>;

    /// Count markers under a filter name.
    async fn count_by_filter(&self, filter_name: &str) -> Result<i64>;

    /// Delete all markers under a filter name (used by `remove` reruns;
    /// the only supported maintenance deletion).
    async fn delete_by_filter(&self, filter_name: &str) -> Result<u64>;
}

/// Store of abbreviation/full-form pairs per paragraph.
#[async_trait]
pub trait CrossrefRepository: Send + Sync {
    /// Pairs previously extracted for a paragraph (or its paper).
    async fn list_for_paragraph(&self, paragraph_id: i64) -> Result<Vec<CrossrefPair>>;

    /// Persist a newly discovered pair; duplicate pairs are no-ops.
    async fn insert(&self, pair: &CrossrefPair) -> Result<()>;
}
