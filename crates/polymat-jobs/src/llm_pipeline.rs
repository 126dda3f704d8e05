//! LLM extraction pipeline.
//!
//! paragraphs → extraction prompt → chat backend (retry with backoff
//! inside the backend) → defensive JSON parsing → deduplicated
//! persistence. A paragraph whose call exhausts its retries yields zero
//! records and its DOI lands on the failed-DOI list reported with the
//! batch summary.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use polymat_core::{CrossrefPair, ExtractionMethod, Paragraph, Result};
use polymat_extract::{CrossrefResolver, KnowledgeBase, PropertyLookup, RecordExtractor};
use polymat_inference::{ExtractionBackend, PromptBuilder};

use crate::context::PipelineContext;
use crate::driver::{BatchDriver, BatchOptions, BatchSummary, RowOutcome, RowProcessor};

/// Checkpointed LLM extraction over the paragraph corpus.
pub struct LlmExtractionPipeline {
    ctx: PipelineContext,
    backend: Arc<dyn ExtractionBackend>,
    extractor: RecordExtractor,
    method: ExtractionMethod,
    props: PropertyLookup,
    prompt: PromptBuilder,
    failed_dois: Mutex<Vec<String>>,
}

impl LlmExtractionPipeline {
    /// Load the method definition and property metadata. Missing method
    /// or metadata rows abort construction (configuration errors).
    pub async fn new(
        ctx: PipelineContext,
        backend: Arc<dyn ExtractionBackend>,
        method_name: &str,
    ) -> Result<Self> {
        let method = ctx.require_method(method_name).await?;
        let props = ctx.property_lookup(&method).await?;
        let prompt = PromptBuilder::with_default_shots(method.params.properties.clone())
            .with_shot_count(method.params.shot_count);
        info!(
            subsystem = "jobs",
            component = "llm_pipeline",
            method_id = method.id,
            model = %method.model,
            "LLM extraction pipeline ready"
        );
        Ok(Self {
            ctx,
            backend,
            extractor: RecordExtractor::new(KnowledgeBase::builtin()),
            method,
            props,
            prompt,
            failed_dois: Mutex::new(Vec::new()),
        })
    }

    /// Run one batch. `redo` ignores the checkpoint; `remove` deletes the
    /// method's prior records and mentions before reprocessing.
    pub async fn process_items(&self, limit: i64, redo: bool, remove: bool) -> Result<BatchSummary> {
        if remove {
            let records = self.ctx.records.delete_by_method(self.method.id).await?;
            let materials = self.ctx.materials.delete_by_method(self.method.id).await?;
            info!(
                subsystem = "jobs",
                component = "llm_pipeline",
                method_id = self.method.id,
                removed_records = records,
                removed_materials = materials,
                "Removed prior output before rerun"
            );
        }

        let driver = BatchDriver::new(
            self.ctx.checkpoints.clone(),
            self.method.name.clone(),
            "paragraphs",
            json!({ "method": self.method.name }),
        );
        let summary = driver
            .run(self, &BatchOptions::default().with_limit(limit).with_redo(redo))
            .await?;

        let failed = self.failed_dois();
        if !failed.is_empty() {
            info!(
                subsystem = "jobs",
                component = "llm_pipeline",
                method_id = self.method.id,
                failed = failed.len(),
                dois = ?failed,
                "Paragraphs with no LLM response this batch"
            );
        }
        Ok(summary)
    }

    /// DOIs whose extraction calls yielded no response after retries.
    pub fn failed_dois(&self) -> Vec<String> {
        self.failed_dois.lock().unwrap().clone()
    }

    async fn resolver_for(&self, paragraph: &Paragraph) -> Result<CrossrefResolver> {
        let mut resolver = CrossrefResolver::new();
        let stored = self.ctx.crossrefs.list_for_paragraph(paragraph.id).await?;
        resolver.seed(&stored);
        for (abbr, full_form) in resolver.process_paragraph(&paragraph.text) {
            self.ctx
                .crossrefs
                .insert(&CrossrefPair {
                    paragraph_id: paragraph.id,
                    abbr,
                    full_form,
                })
                .await?;
        }
        Ok(resolver)
    }
}

#[async_trait]
impl RowProcessor for LlmExtractionPipeline {
    type Row = Paragraph;

    fn row_id(row: &Paragraph) -> i64 {
        row.id
    }

    async fn fetch_after(&self, last: i64, limit: i64) -> Result<Vec<Paragraph>> {
        self.ctx
            .paragraphs
            .fetch_after(last, limit, self.method.params.paragraph_source.as_deref())
            .await
    }

    async fn process(&self, paragraph: &Paragraph) -> Result<RowOutcome> {
        let resolver = self.resolver_for(paragraph).await?;

        let prompt = self.prompt.build(&paragraph.text);
        // No transaction is held across this call.
        let Some(response) = self.backend.extract_records(&prompt).await? else {
            warn!(
                subsystem = "jobs",
                component = "llm_pipeline",
                paragraph_id = paragraph.id,
                doi = %paragraph.doi,
                "No LLM response after retries, zero records for paragraph"
            );
            self.failed_dois.lock().unwrap().push(paragraph.doi.clone());
            return Ok(RowOutcome::Skipped);
        };

        let records = self
            .extractor
            .extract_from_json(&response, &resolver, &self.props);

        let mut created = 0usize;
        for record in &records {
            let material_id = self
                .ctx
                .materials
                .find_or_insert(paragraph.id, self.method.id, &record.material)
                .await?;
            let (_, inserted) = self
                .ctx
                .records
                .insert_deduplicated(self.method.id, material_id, paragraph.id, &record.property)
                .await?;
            if inserted {
                created += 1;
            }
        }

        debug!(
            subsystem = "jobs",
            component = "llm_pipeline",
            paragraph_id = paragraph.id,
            doi = %paragraph.doi,
            record_count = created,
            "Paragraph processed"
        );
        Ok(if created > 0 {
            RowOutcome::Recorded(created)
        } else {
            RowOutcome::Skipped
        })
    }
}
