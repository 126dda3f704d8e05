//! NER extraction pipeline.
//!
//! paragraphs → tagger sidecar → tag alignment → grouping → record
//! extraction → deduplicated persistence, driven by the checkpointed
//! batch loop. Tagger and alignment failures abandon the paragraph and
//! the batch continues; the watermark still advances past it.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use polymat_core::{CrossrefPair, ExtractionMethod, Paragraph, Result};
use polymat_extract::{
    align, group_consecutive_tags, CrossrefResolver, KnowledgeBase, PropertyLookup,
    RecordExtractor,
};
use polymat_inference::NerTagger;
use std::sync::Arc;

use crate::context::PipelineContext;
use crate::driver::{BatchDriver, BatchOptions, BatchSummary, RowOutcome, RowProcessor};

/// Checkpointed NER extraction over the paragraph corpus.
pub struct NerExtractionPipeline {
    ctx: PipelineContext,
    tagger: Arc<dyn NerTagger>,
    extractor: RecordExtractor,
    method: ExtractionMethod,
    props: PropertyLookup,
}

impl std::fmt::Debug for NerExtractionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NerExtractionPipeline")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl NerExtractionPipeline {
    /// Load the method definition and property metadata. Missing method
    /// or metadata rows abort construction (configuration errors).
    pub async fn new(
        ctx: PipelineContext,
        tagger: Arc<dyn NerTagger>,
        method_name: &str,
    ) -> Result<Self> {
        let method = ctx.require_method(method_name).await?;
        let props = ctx.property_lookup(&method).await?;
        info!(
            subsystem = "jobs",
            component = "ner_pipeline",
            method_id = method.id,
            model = %method.model,
            "NER extraction pipeline ready"
        );
        Ok(Self {
            ctx,
            tagger,
            extractor: RecordExtractor::new(KnowledgeBase::builtin()),
            method,
            props,
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
                component = "ner_pipeline",
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
        driver
            .run(self, &BatchOptions::default().with_limit(limit).with_redo(redo))
            .await
    }

    /// Resolve cross-references for a paragraph: seed from storage, scan
    /// the text, persist anything new.
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
impl RowProcessor for NerExtractionPipeline {
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

        // Transactions are never held across this call.
        let spans = self.tagger.tag(&paragraph.text).await?;
        let tags = align(&paragraph.text, &spans)?;
        let groups = group_consecutive_tags(&tags);
        let records = self
            .extractor
            .extract_from_groups(&groups, &resolver, &self.props);

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
            component = "ner_pipeline",
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
