//! # polymat-jobs
//!
//! Incremental batch processing for polymat.
//!
//! This crate provides:
//! - The generic checkpointed batch driver (fetch past the watermark,
//!   process in id order, continue on error, advance the checkpoint)
//! - The NER and LLM extraction pipelines
//! - The data-driven post-extraction validator chain
//! - The `pipeline` runner binary
//!
//! One pipeline instance per checkpoint name at a time; concurrency
//! comes from running independent checkpoint names as separate
//! processes, never from intra-process parallelism.

pub mod context;
pub mod driver;
pub mod llm_pipeline;
pub mod ner_pipeline;
pub mod validators;

pub use context::PipelineContext;
pub use driver::{BatchDriver, BatchOptions, BatchSummary, RowOutcome, RowProcessor};
pub use llm_pipeline::LlmExtractionPipeline;
pub use ner_pipeline::NerExtractionPipeline;
pub use validators::{
    selected_unit_validator, standard_validators, validator_by_name, PersistMode, Validator,
    ValidatorKind, ValidatorRunner,
};
