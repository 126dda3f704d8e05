//! Shared repository bundle for pipelines and validators.
//!
//! Repositories are injected as trait objects so pipelines run unchanged
//! over Postgres in production and in-memory doubles in tests. No
//! component reaches for global connection state.

use std::sync::Arc;

use polymat_core::{
    CheckpointRepository, CrossrefRepository, Error, ExtractionMethod, FilteredDataRepository,
    MaterialRepository, MethodRepository, ParagraphRepository, PropertyRepository,
    RecordRepository, Result,
};
use polymat_extract::PropertyLookup;

/// Repository set a pipeline runs against.
#[derive(Clone)]
pub struct PipelineContext {
    pub paragraphs: Arc<dyn ParagraphRepository>,
    pub materials: Arc<dyn MaterialRepository>,
    pub records: Arc<dyn RecordRepository>,
    pub properties: Arc<dyn PropertyRepository>,
    pub methods: Arc<dyn MethodRepository>,
    pub checkpoints: Arc<dyn CheckpointRepository>,
    pub filtered: Arc<dyn FilteredDataRepository>,
    pub crossrefs: Arc<dyn CrossrefRepository>,
}

impl PipelineContext {
    /// Wrap a connected [`polymat_db::Database`].
    pub fn from_database(db: polymat_db::Database) -> Self {
        Self {
            paragraphs: Arc::new(db.paragraphs),
            materials: Arc::new(db.materials),
            records: Arc::new(db.records),
            properties: Arc::new(db.properties),
            methods: Arc::new(db.methods),
            checkpoints: Arc::new(db.checkpoints),
            filtered: Arc::new(db.filtered),
            crossrefs: Arc::new(db.crossrefs),
        }
    }

    /// Load a method by name. Absence is a fatal configuration error.
    pub async fn require_method(&self, name: &str) -> Result<ExtractionMethod> {
        self.methods
            .get_by_name(name)
            .await?
            .ok_or_else(|| Error::Config(format!("extraction method {name:?} is not defined")))
    }

    /// Build the property lookup for a method. Each configured property
    /// must have a metadata row; a missing row is a fatal configuration
    /// error. Methods with no configured properties see every known
    /// property.
    pub async fn property_lookup(&self, method: &ExtractionMethod) -> Result<PropertyLookup> {
        if method.params.properties.is_empty() {
            return Ok(PropertyLookup::new(self.properties.list_all().await?));
        }

        let mut metas = Vec::with_capacity(method.params.properties.len());
        for name in &method.params.properties {
            let meta = self.properties.get_by_name(name).await?.ok_or_else(|| {
                Error::Config(format!("property metadata for {name:?} is missing"))
            })?;
            metas.push(meta);
        }
        Ok(PropertyLookup::new(metas))
    }
}
