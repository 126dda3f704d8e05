//! Batch pipeline runner.
//!
//! Dispatches on `POLYMAT_PIPELINE`:
//! - `ner` — NER extraction over new paragraphs
//! - `llm` — LLM extraction over new paragraphs
//! - any validator marker name (e.g. `invalid_property_unit`) — one
//!   validator batch
//!
//! Remaining configuration comes from the environment: database URL,
//! tagger/LLM endpoints, method name, and the standard
//! `limit`/`redo`/`remove` flags.

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use polymat_core::defaults;
use polymat_db::{ensure_schema, Database};
use polymat_inference::{OpenAiBackend, SidecarTagger};
use polymat_jobs::{
    validator_by_name, LlmExtractionPipeline, NerExtractionPipeline, PipelineContext,
    ValidatorRunner,
};

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let pipeline = std::env::var(defaults::ENV_PIPELINE)
        .context("POLYMAT_PIPELINE must name a pipeline or validator")?;
    let method = std::env::var(defaults::ENV_METHOD)
        .context("POLYMAT_METHOD must name an extraction method")?;
    let database_url = std::env::var(defaults::ENV_DATABASE_URL)
        .context("POLYMAT_DATABASE_URL must point at the polymat database")?;

    let limit: i64 = std::env::var("POLYMAT_LIMIT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::BATCH_LIMIT);
    let redo = env_flag("POLYMAT_REDO");
    let remove = env_flag("POLYMAT_REMOVE");

    let db = Database::connect(&database_url).await?;
    ensure_schema(&db.pool).await?;
    let ctx = PipelineContext::from_database(db);

    let summary = match pipeline.as_str() {
        "ner" => {
            let tagger = SidecarTagger::from_env()
                .context("tagger sidecar is not configured (POLYMAT_TAGGER_BASE_URL)")?;
            let pipeline = NerExtractionPipeline::new(ctx, Arc::new(tagger), &method).await?;
            pipeline.process_items(limit, redo, remove).await?
        }
        "llm" => {
            let backend = OpenAiBackend::from_env()?;
            let pipeline = LlmExtractionPipeline::new(ctx, Arc::new(backend), &method).await?;
            pipeline.process_items(limit, redo, remove).await?
        }
        name => {
            let Some(validator) = validator_by_name(name) else {
                bail!("unknown pipeline {name:?}");
            };
            let runner = ValidatorRunner::new(ctx, &method, validator).await?;
            runner.process_items(limit, redo, remove).await?
        }
    };

    info!(
        processed = summary.processed,
        passed = summary.passed,
        failed = summary.failed,
        record_count = summary.records,
        watermark = summary.watermark,
        "Run complete"
    );
    Ok(())
}
