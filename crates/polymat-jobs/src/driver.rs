//! Generic incremental batch driver.
//!
//! The reusable "select unprocessed rows beyond the checkpoint, process
//! each, persist, advance the checkpoint" loop every pipeline and
//! validator instantiates. Per-row failures are values, not exceptions:
//! the driver matches on the processor's `Result` and continues on
//! anything non-fatal, advancing the in-memory watermark either way.
//!
//! A row that always fails is therefore permanently skipped after its
//! first encounter. That is intentional forward-progress-over-
//! completeness; see the driver tests.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use polymat_core::{defaults, CheckpointRepository, Result};

/// Outcome of processing one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// Row processed; N records/markers were persisted.
    Recorded(usize),
    /// Row evaluated; nothing needed persisting.
    Skipped,
}

/// A batch step: fetches candidate rows past a watermark and processes
/// them one at a time.
#[async_trait]
pub trait RowProcessor: Send + Sync {
    type Row: Send + Sync;

    /// Stable ascending id of a candidate row.
    fn row_id(row: &Self::Row) -> i64;

    /// Up to `limit` candidate rows with id greater than `last`, ordered
    /// by id ascending.
    async fn fetch_after(&self, last: i64, limit: i64) -> Result<Vec<Self::Row>>;

    /// Process one row. Non-fatal errors are logged by the driver and the
    /// batch continues; fatal (configuration) errors abort it.
    async fn process(&self, row: &Self::Row) -> Result<RowOutcome>;
}

/// Options for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum candidate rows to fetch.
    pub limit: i64,
    /// Ignore the existing checkpoint and reprocess from 0.
    pub redo: bool,
    /// Stop early after this many rows, regardless of outcome.
    pub debug_cap: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            limit: defaults::BATCH_LIMIT,
            redo: false,
            debug_cap: defaults::DEBUG_CAP,
        }
    }
}

impl BatchOptions {
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_redo(mut self, redo: bool) -> Self {
        self.redo = redo;
        self
    }

    pub fn with_debug_cap(mut self, cap: Option<usize>) -> Self {
        self.debug_cap = cap;
        self
    }
}

/// Counts reported at the end of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Rows handled (success or failure).
    pub processed: usize,
    /// Rows whose processing succeeded and persisted something.
    pub passed: usize,
    /// Rows skipped on a non-fatal error.
    pub failed: usize,
    /// Records/markers persisted across the batch.
    pub records: usize,
    /// Final watermark (last seen row id).
    pub watermark: i64,
    /// Whether the final checkpoint write was accepted.
    pub checkpoint_committed: bool,
}

/// The checkpointed batch loop.
pub struct BatchDriver {
    checkpoints: Arc<dyn CheckpointRepository>,
    name: String,
    table: String,
    context: JsonValue,
    commit_interval: usize,
}

impl BatchDriver {
    pub fn new(
        checkpoints: Arc<dyn CheckpointRepository>,
        name: impl Into<String>,
        table: impl Into<String>,
        context: JsonValue,
    ) -> Self {
        Self {
            checkpoints,
            name: name.into(),
            table: table.into(),
            context,
            commit_interval: defaults::COMMIT_INTERVAL,
        }
    }

    pub fn with_commit_interval(mut self, rows: usize) -> Self {
        self.commit_interval = rows.max(1);
        self
    }

    /// Run one batch.
    ///
    /// Rows are processed strictly in ascending id order. The in-memory
    /// watermark advances past every handled row, including failed ones;
    /// the checkpoint is persisted at the end (and at commit intervals,
    /// so partial progress survives a killed process).
    pub async fn run<P: RowProcessor>(
        &self,
        processor: &P,
        opts: &BatchOptions,
    ) -> Result<BatchSummary> {
        let start = Instant::now();
        let last = if opts.redo {
            0
        } else {
            self.checkpoints
                .get_last(&self.name, &self.table, &self.context)
                .await?
        };

        let rows = processor.fetch_after(last, opts.limit).await?;
        info!(
            subsystem = "jobs",
            component = "driver",
            checkpoint = %self.name,
            db_table = %self.table,
            candidate_count = rows.len(),
            watermark = last,
            redo = opts.redo,
            "Batch started"
        );

        let mut summary = BatchSummary {
            watermark: last,
            ..Default::default()
        };
        let mut last_committed = last;

        for row in &rows {
            let id = P::row_id(row);
            // Safety net against off-by-one query races.
            if id <= last {
                continue;
            }
            if let Some(cap) = opts.debug_cap {
                if summary.processed >= cap {
                    info!(
                        subsystem = "jobs",
                        component = "driver",
                        checkpoint = %self.name,
                        cap,
                        "Debug cap reached, stopping batch early"
                    );
                    break;
                }
            }

            match processor.process(row).await {
                Ok(RowOutcome::Recorded(n)) => {
                    summary.processed += 1;
                    summary.passed += 1;
                    summary.records += n;
                }
                Ok(RowOutcome::Skipped) => {
                    summary.processed += 1;
                }
                Err(e) if e.is_fatal() => {
                    error!(
                        subsystem = "jobs",
                        component = "driver",
                        checkpoint = %self.name,
                        row = id,
                        error = %e,
                        "Fatal configuration error, aborting batch"
                    );
                    return Err(e);
                }
                Err(e) => {
                    summary.processed += 1;
                    summary.failed += 1;
                    warn!(
                        subsystem = "jobs",
                        component = "driver",
                        checkpoint = %self.name,
                        row = id,
                        error = %e,
                        "Row failed, continuing batch"
                    );
                }
            }

            // Advance past the row regardless of outcome.
            summary.watermark = id;

            if summary.processed % self.commit_interval == 0 && summary.watermark > last_committed
            {
                if self
                    .checkpoints
                    .add_new(&self.name, &self.table, summary.watermark, &self.context)
                    .await?
                {
                    last_committed = summary.watermark;
                }
            }
        }

        summary.checkpoint_committed = if summary.watermark > last_committed {
            let committed = self
                .checkpoints
                .add_new(&self.name, &self.table, summary.watermark, &self.context)
                .await?;
            if !committed {
                error!(
                    subsystem = "jobs",
                    component = "driver",
                    checkpoint = %self.name,
                    watermark = summary.watermark,
                    "Final checkpoint write rejected"
                );
            }
            committed
        } else {
            // Everything seen was already committed at a commit interval
            // (or no row advanced the watermark at all).
            last_committed > last
        };

        info!(
            subsystem = "jobs",
            component = "driver",
            checkpoint = %self.name,
            processed = summary.processed,
            passed = summary.passed,
            failed = summary.failed,
            record_count = summary.records,
            watermark = summary.watermark,
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch finished"
        );
        Ok(summary)
    }
}
