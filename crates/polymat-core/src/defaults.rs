//! Centralized default constants for the polymat system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// BATCH PROCESSING
// =============================================================================

/// Default number of candidate rows fetched per batch.
pub const BATCH_LIMIT: i64 = 500;

/// Rows between periodic data commits inside a batch. Keeps transactions
/// small so partial progress survives a killed process.
pub const COMMIT_INTERVAL: usize = 50;

/// Default debug cap: none. Set via `BatchOptions::debug_cap` to stop a
/// batch early after N rows regardless of outcome.
pub const DEBUG_CAP: Option<usize> = None;

// =============================================================================
// FUZZY MATCHING
// =============================================================================

/// Token-set similarity score cutoff (0-100) for material-name and
/// cross-reference resolution. Matches below this score are discarded.
pub const FUZZY_CUTOFF: u8 = 96;

/// Maximum preceding words considered as a full-form candidate in the
/// manual parenthetical cross-reference pass.
pub const CROSSREF_MAX_WORDS: usize = 5;

// =============================================================================
// LLM RETRY
// =============================================================================

/// Maximum attempts for a retryable LLM call (1 initial + retries).
pub const LLM_MAX_ATTEMPTS: u32 = 4;

/// Base backoff delay in milliseconds (doubled per attempt).
pub const LLM_BACKOFF_BASE_MS: u64 = 500;

/// Maximum random jitter in milliseconds added to each backoff delay.
pub const LLM_BACKOFF_JITTER_MS: u64 = 250;

/// Request timeout for LLM chat completions, in seconds.
pub const LLM_TIMEOUT_SECS: u64 = 120;

/// Default number of few-shot examples in an extraction prompt.
pub const PROMPT_SHOT_COUNT: usize = 3;

// =============================================================================
// NER TAGGER
// =============================================================================

/// Request timeout for the tagger sidecar, in seconds.
pub const TAGGER_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// TABLE DETECTION
// =============================================================================

/// Window size (characters) for the rendered-table heuristic.
pub const TABLE_WINDOW_CHARS: usize = 20;

/// Minimum digit-whitespace-digit hits within one window to flag a
/// paragraph as a likely rendered table row.
pub const TABLE_MIN_HITS: usize = 3;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Connection string for the polymat database.
pub const ENV_DATABASE_URL: &str = "POLYMAT_DATABASE_URL";

/// Base URL of the NER tagger sidecar. Empty string disables tagging.
pub const ENV_TAGGER_BASE_URL: &str = "POLYMAT_TAGGER_BASE_URL";

/// Base URL of the OpenAI-compatible LLM endpoint.
pub const ENV_LLM_BASE_URL: &str = "POLYMAT_LLM_BASE_URL";

/// API key for the LLM endpoint.
pub const ENV_LLM_API_KEY: &str = "POLYMAT_LLM_API_KEY";

/// Pipeline selector for the runner binary: "ner", "llm", or a validator
/// name.
pub const ENV_PIPELINE: &str = "POLYMAT_PIPELINE";

/// Extraction method name the runner binary loads.
pub const ENV_METHOD: &str = "POLYMAT_METHOD";
