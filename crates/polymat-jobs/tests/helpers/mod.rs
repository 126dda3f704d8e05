//! In-memory repository doubles for pipeline and driver tests.
//!
//! These mirror the Postgres repositories' contracts (deduplication,
//! checkpoint monotonicity, marker idempotence) without a database.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use polymat_core::*;

/// Shallow JSON containment: every key in `query` must match in `stored`.
fn context_matches(stored: &JsonValue, query: &JsonValue) -> bool {
    match query.as_object() {
        Some(map) => map.iter().all(|(k, v)| stored.get(k) == Some(v)),
        None => true,
    }
}

// =============================================================================
// PARAGRAPHS
// =============================================================================

pub struct MemoryParagraphs {
    rows: Mutex<Vec<Paragraph>>,
}

impl MemoryParagraphs {
    pub fn new(rows: Vec<Paragraph>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }
}

#[async_trait]
impl ParagraphRepository for MemoryParagraphs {
    async fn insert(&self, paper_id: i64, doi: &str, text: &str, source: &str) -> Result<i64> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        rows.push(Paragraph {
            id,
            paper_id,
            doi: doi.to_string(),
            text: text.to_string(),
            source: source.to_string(),
        });
        Ok(id)
    }

    async fn fetch(&self, id: i64) -> Result<Paragraph> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(Error::ParagraphNotFound(id))
    }

    async fn fetch_after(
        &self,
        after: i64,
        limit: i64,
        source: Option<&str>,
    ) -> Result<Vec<Paragraph>> {
        let mut rows: Vec<Paragraph> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.id > after && source.map_or(true, |s| p.source == s))
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.id);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }
}

// =============================================================================
// MATERIALS
// =============================================================================

struct StoredMention {
    id: i64,
    paragraph_id: i64,
    method_id: i64,
    mention: MaterialMention,
}

#[derive(Default)]
pub struct MemoryMaterials {
    rows: Mutex<Vec<StoredMention>>,
}

impl MemoryMaterials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl MaterialRepository for MemoryMaterials {
    async fn find_or_insert(
        &self,
        paragraph_id: i64,
        method_id: i64,
        mention: &MaterialMention,
    ) -> Result<i64> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter().find(|r| {
            r.paragraph_id == paragraph_id
                && r.method_id == method_id
                && r.mention.entity_name == mention.entity_name
        }) {
            return Ok(existing.id);
        }
        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        rows.push(StoredMention {
            id,
            paragraph_id,
            method_id,
            mention: mention.clone(),
        });
        Ok(id)
    }

    async fn delete_by_method(&self, method_id: i64) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.method_id != method_id);
        Ok((before - rows.len()) as u64)
    }
}

// =============================================================================
// RECORDS
// =============================================================================

struct StoredRecord {
    id: i64,
    method_id: i64,
    material_id: i64,
    paragraph_id: i64,
    pair: PropertyValuePair,
}

#[derive(Default)]
pub struct MemoryRecords {
    rows: Mutex<Vec<StoredRecord>>,
    /// Pre-seeded candidate rows for validator tests.
    validation_rows: Mutex<Vec<RecordRow>>,
    /// Marker store consulted for upstream-filter restriction.
    markers: Option<Arc<MemoryFiltered>>,
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validation_rows(rows: Vec<RecordRow>, markers: Arc<MemoryFiltered>) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            validation_rows: Mutex::new(rows),
            markers: Some(markers),
        }
    }

    pub fn stored_values(&self) -> Vec<(i64, Option<f64>)> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.paragraph_id, r.pair.numeric_value))
            .collect()
    }
}

#[async_trait]
impl RecordRepository for MemoryRecords {
    async fn insert_deduplicated(
        &self,
        method_id: i64,
        material_id: i64,
        paragraph_id: i64,
        pair: &PropertyValuePair,
    ) -> Result<(i64, bool)> {
        let Some(numeric_value) = pair.numeric_value else {
            return Err(Error::InvalidInput(format!(
                "record {:?} has no numeric value",
                pair.entity_name
            )));
        };
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter().find(|r| {
            r.method_id == method_id
                && r.material_id == material_id
                && r.pair.entity_name == pair.entity_name
                && r.pair.numeric_value == Some(numeric_value)
        }) {
            return Ok((existing.id, false));
        }
        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        rows.push(StoredRecord {
            id,
            method_id,
            material_id,
            paragraph_id,
            pair: pair.clone(),
        });
        Ok((id, true))
    }

    async fn fetch_for_validation(
        &self,
        method_id: i64,
        after: i64,
        limit: i64,
        upstream_filter: Option<&str>,
    ) -> Result<Vec<RecordRow>> {
        let mut rows: Vec<RecordRow> = self
            .validation_rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method_id == method_id && r.id > after)
            .filter(|r| match (upstream_filter, &self.markers) {
                (Some(filter), Some(markers)) => markers.has(r.id, filter),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn delete_by_method(&self, method_id: i64) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.method_id != method_id);
        Ok((before - rows.len()) as u64)
    }

    async fn count_by_method(&self, method_id: i64) -> Result<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method_id == method_id)
            .count() as i64)
    }
}

// =============================================================================
// PROPERTIES / METHODS
// =============================================================================

pub struct MemoryProperties {
    metas: Vec<PropertyMetadata>,
}

impl MemoryProperties {
    pub fn new(metas: Vec<PropertyMetadata>) -> Self {
        Self { metas }
    }
}

#[async_trait]
impl PropertyRepository for MemoryProperties {
    async fn get_by_name(&self, name: &str) -> Result<Option<PropertyMetadata>> {
        Ok(self.metas.iter().find(|m| m.name == name).cloned())
    }

    async fn list_all(&self) -> Result<Vec<PropertyMetadata>> {
        Ok(self.metas.clone())
    }
}

pub struct MemoryMethods {
    methods: Vec<ExtractionMethod>,
}

impl MemoryMethods {
    pub fn new(methods: Vec<ExtractionMethod>) -> Self {
        Self { methods }
    }
}

#[async_trait]
impl MethodRepository for MemoryMethods {
    async fn get_by_name(&self, name: &str) -> Result<Option<ExtractionMethod>> {
        Ok(self.methods.iter().find(|m| m.name == name).cloned())
    }
}

// =============================================================================
// CHECKPOINTS
// =============================================================================

#[derive(Default)]
pub struct MemoryCheckpoints {
    rows: Mutex<Vec<Checkpoint>>,
}

impl MemoryCheckpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl CheckpointRepository for MemoryCheckpoints {
    async fn get_last(&self, name: &str, table: &str, context: &JsonValue) -> Result<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                c.name == name && c.table_name == table && context_matches(&c.context, context)
            })
            .map(|c| c.row)
            .max()
            .unwrap_or(0))
    }

    async fn add_new(
        &self,
        name: &str,
        table: &str,
        row: i64,
        context: &JsonValue,
    ) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        // Monotonicity is checked across ALL contexts for (name, table).
        let existing = rows
            .iter()
            .filter(|c| c.name == name && c.table_name == table)
            .map(|c| c.row)
            .max();
        if !advance_allowed(existing, row) {
            return Ok(false);
        }
        let id = rows.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        rows.push(Checkpoint {
            id,
            name: name.to_string(),
            table_name: table.to_string(),
            row,
            context: context.clone(),
            created_at: chrono::Utc::now(),
        });
        Ok(true)
    }

    async fn list_all(
        &self,
        name: &str,
        table: &str,
        context: &JsonValue,
    ) -> Result<Vec<Checkpoint>> {
        let mut rows: Vec<Checkpoint> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                c.name == name && c.table_name == table && context_matches(&c.context, context)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|c| std::cmp::Reverse(c.id));
        Ok(rows)
    }
}

// =============================================================================
// FILTERED DATA
// =============================================================================

#[derive(Default)]
pub struct MemoryFiltered {
    rows: Mutex<Vec<FilteredRow>>,
}

impl MemoryFiltered {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, table_row: i64, filter_name: &str) -> bool {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.table_row == table_row && r.filter_name == filter_name)
    }

    pub fn all(&self) -> Vec<FilteredRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl FilteredDataRepository for MemoryFiltered {
    async fn add(&self, row: &FilteredRow) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if !rows.contains(row) {
            rows.push(row.clone());
        }
        Ok(())
    }

    async fn exists(&self, table: &str, table_row: i64, filter_name: &str) -> Result<bool> {
        Ok(self.rows.lock().unwrap().iter().any(|r| {
            r.table_name == table && r.table_row == table_row && r.filter_name == filter_name
        }))
    }

    async fn count_by_filter(&self, filter_name: &str) -> Result<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.filter_name == filter_name)
            .count() as i64)
    }

    async fn delete_by_filter(&self, filter_name: &str) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.filter_name != filter_name);
        Ok((before - rows.len()) as u64)
    }
}

// =============================================================================
// CROSSREFS
// =============================================================================

#[derive(Default)]
pub struct MemoryCrossrefs {
    pairs: Mutex<Vec<CrossrefPair>>,
}

impl MemoryCrossrefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<CrossrefPair> {
        self.pairs.lock().unwrap().clone()
    }
}

#[async_trait]
impl CrossrefRepository for MemoryCrossrefs {
    async fn list_for_paragraph(&self, paragraph_id: i64) -> Result<Vec<CrossrefPair>> {
        let _ = paragraph_id;
        Ok(self.pairs.lock().unwrap().clone())
    }

    async fn insert(&self, pair: &CrossrefPair) -> Result<()> {
        let mut pairs = self.pairs.lock().unwrap();
        if !pairs
            .iter()
            .any(|p| p.paragraph_id == pair.paragraph_id && p.abbr == pair.abbr)
        {
            pairs.push(pair.clone());
        }
        Ok(())
    }
}

// =============================================================================
// CONTEXT ASSEMBLY
// =============================================================================

/// Bundle of memory stores with handles retained for assertions.
pub struct MemoryStores {
    pub paragraphs: Arc<MemoryParagraphs>,
    pub materials: Arc<MemoryMaterials>,
    pub records: Arc<MemoryRecords>,
    pub properties: Arc<MemoryProperties>,
    pub methods: Arc<MemoryMethods>,
    pub checkpoints: Arc<MemoryCheckpoints>,
    pub filtered: Arc<MemoryFiltered>,
    pub crossrefs: Arc<MemoryCrossrefs>,
}

impl MemoryStores {
    pub fn context(&self) -> polymat_jobs::PipelineContext {
        polymat_jobs::PipelineContext {
            paragraphs: self.paragraphs.clone(),
            materials: self.materials.clone(),
            records: self.records.clone(),
            properties: self.properties.clone(),
            methods: self.methods.clone(),
            checkpoints: self.checkpoints.clone(),
            filtered: self.filtered.clone(),
            crossrefs: self.crossrefs.clone(),
        }
    }
}

/// A method definition for tests.
pub fn test_method(id: i64, name: &str, api: ApiKind) -> ExtractionMethod {
    ExtractionMethod {
        id,
        name: name.to_string(),
        model: "test-model".to_string(),
        api,
        params: MethodParams::default(),
    }
}

/// Tg metadata used across pipeline tests.
pub fn tg_metadata() -> PropertyMetadata {
    PropertyMetadata {
        id: 1,
        name: "glass transition temperature".to_string(),
        synonyms: vec!["Tg".to_string(), "glass transition".to_string()],
        units: vec!["° C".to_string()],
        lower_limit: -150.0,
        upper_limit: 500.0,
        percent_scale: false,
    }
}

/// Assemble stores around a paragraph corpus and one method.
pub fn stores_with(paragraphs: Vec<Paragraph>, method: ExtractionMethod) -> MemoryStores {
    MemoryStores {
        paragraphs: Arc::new(MemoryParagraphs::new(paragraphs)),
        materials: Arc::new(MemoryMaterials::new()),
        records: Arc::new(MemoryRecords::new()),
        properties: Arc::new(MemoryProperties::new(vec![tg_metadata()])),
        methods: Arc::new(MemoryMethods::new(vec![method])),
        checkpoints: Arc::new(MemoryCheckpoints::new()),
        filtered: Arc::new(MemoryFiltered::new()),
        crossrefs: Arc::new(MemoryCrossrefs::new()),
    }
}

/// A paragraph row for tests.
pub fn paragraph(id: i64, doi: &str, text: &str) -> Paragraph {
    Paragraph {
        id,
        paper_id: 1,
        doi: doi.to_string(),
        text: text.to_string(),
        source: "test".to_string(),
    }
}
