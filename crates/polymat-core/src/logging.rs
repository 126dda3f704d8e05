//! Structured logging schema and field name constants for polymat.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Checkpoint write rejected, repository failure, operator attention |
//! | WARN  | Per-row skip (parse failure, unresolved material), retry, filter fail |
//! | INFO  | Batch start/end, summary counts, pool lifecycle |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-token, per-span, per-record iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "extract", "inference", "db", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "aligner", "value_parser", "checkpoint", "driver", "validator"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "align", "parse_value", "add_new", "process_items"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Paragraph id being operated on.
pub const PARAGRAPH_ID: &str = "paragraph_id";

/// Extraction method id.
pub const METHOD_ID: &str = "method_id";

/// DOI of the source paper.
pub const DOI: &str = "doi";

/// Checkpoint name.
pub const CHECKPOINT_NAME: &str = "checkpoint";

/// Validator/filter name.
pub const FILTER_NAME: &str = "filter";

/// Property name a record or filter group refers to.
pub const PROPERTY: &str = "property";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows fetched as batch candidates.
pub const CANDIDATE_COUNT: &str = "candidate_count";

/// Number of rows processed in a batch.
pub const PROCESSED: &str = "processed";

/// Number of rows that passed a filter or yielded records.
pub const PASSED: &str = "passed";

/// Number of rows skipped on error.
pub const FAILED: &str = "failed";

/// Number of records persisted.
pub const RECORD_COUNT: &str = "record_count";

/// Last row id committed to the checkpoint store.
pub const WATERMARK: &str = "watermark";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table or entity affected.
pub const DB_TABLE: &str = "db_table";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for tagging or generation.
pub const MODEL: &str = "model";

/// Retry attempt number for an LLM call.
pub const ATTEMPT: &str = "attempt";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
