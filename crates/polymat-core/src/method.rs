//! Extraction method definitions.
//!
//! A method is a named, versioned configuration describing one extraction
//! pipeline run (model, API kind, paragraph subset, parameters). Parameter
//! defaulting is applied exactly once when a method row is loaded from
//! storage; reading a parameter never mutates the stored definition.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::defaults;
use crate::error::{Error, Result};

/// Which extraction collaborator a method drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKind {
    /// Sequence-tagging through the NER sidecar.
    NerSidecar,
    /// Prompt-based extraction through an OpenAI-compatible endpoint.
    OpenAi,
}

impl ApiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKind::NerSidecar => "ner_sidecar",
            ApiKind::OpenAi => "openai",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "ner_sidecar" => Ok(ApiKind::NerSidecar),
            "openai" => Ok(ApiKind::OpenAi),
            other => Err(Error::Config(format!("unknown method api: {other}"))),
        }
    }
}

/// Validated per-method parameters.
///
/// Every field has an explicit default; unknown keys in the stored JSON
/// are rejected so a typo in a method definition fails at load time
/// instead of silently running with defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct MethodParams {
    /// Number of few-shot examples included in the extraction prompt.
    pub shot_count: usize,
    /// Sampling temperature for LLM extraction.
    pub temperature: f64,
    /// Completion token budget for LLM extraction.
    pub max_tokens: u32,
    /// Restrict the paragraph query to one source tag, if set.
    pub paragraph_source: Option<String>,
    /// Property names this method extracts.
    pub properties: Vec<String>,
}

impl Default for MethodParams {
    fn default() -> Self {
        Self {
            shot_count: defaults::PROMPT_SHOT_COUNT,
            temperature: 0.0,
            max_tokens: 1024,
            paragraph_source: None,
            properties: Vec::new(),
        }
    }
}

impl MethodParams {
    /// Parse stored method parameters, applying defaults for absent keys.
    ///
    /// `null` is treated as an empty parameter object.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
            .map_err(|e| Error::Config(format!("invalid method params: {e}")))
    }
}

/// A named extraction method loaded from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMethod {
    pub id: i64,
    pub name: String,
    /// Model identifier handed to the collaborator.
    pub model: String,
    pub api: ApiKind,
    pub params: MethodParams,
}
