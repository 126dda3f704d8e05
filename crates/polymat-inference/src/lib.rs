//! # polymat-inference
//!
//! External model collaborators for polymat.
//!
//! This crate provides:
//! - NER tagger sidecar client (character-offset span output)
//! - OpenAI-compatible LLM extraction backend with bounded
//!   backoff-and-jitter retry
//! - Extraction prompt construction with a pluggable few-shot
//!   selection strategy
//! - Mock backends for tests and offline runs

pub mod llm;
pub mod mock;
pub mod ner;
pub mod prompts;

// Re-export core types
pub use polymat_core::{Error, Result, TagSpan};

pub use llm::{find_json_array, ExtractionBackend, OpenAiBackend, OpenAiConfig};
pub use mock::{MockExtractionBackend, MockTagger};
pub use ner::{NerTagger, SidecarTagger};
pub use prompts::{
    default_shots, FixedShotSelector, PromptBuilder, RandomShotSelector, Shot, ShotSelector,
};
