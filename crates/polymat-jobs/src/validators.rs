//! Post-extraction validator chain.
//!
//! Validators are data, not subclasses: each is a
//! (name, predicate kind, persist mode, optional upstream marker) record
//! executed by one generic runner on top of the batch driver. Markers are
//! append-only rows in `filtered_data`; validators never mutate the
//! records they score.
//!
//! Chaining happens in SQL: a validator with an `upstream` marker name
//! only sees candidate rows already marked under that name, so filter
//! pipelines compose without an in-memory intermediate representation.

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use tracing::{info, warn};

use polymat_core::{defaults, ExtractionMethod, FilteredRow, MaterialClass, RecordRow, Result};
use polymat_extract::PropertyLookup;

use crate::context::PipelineContext;
use crate::driver::{BatchDriver, BatchOptions, BatchSummary, RowOutcome, RowProcessor};

/// Source table validators read and mark.
const RECORDS_TABLE: &str = "records";

/// When a validator persists its marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistMode {
    /// Mark rows that fail the predicate (and warn).
    OnFail,
    /// Mark rows that pass the predicate (selection markers).
    OnPass,
}

/// The predicate a validator evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorKind {
    /// entity_name is a known property synonym (case-insensitive).
    Name,
    /// unit is in the property's known-unit list, or both are empty.
    Unit,
    /// numeric_value lies within the property's [lower, upper] limits.
    Range,
    /// material_class is POLYMER (always-true passthrough, used to tag).
    Polymer,
    /// Source paragraph looks like a rendered table row.
    Table,
}

/// One validator definition.
#[derive(Debug, Clone)]
pub struct Validator {
    /// Marker name persisted to `filtered_data`.
    pub name: &'static str,
    pub kind: ValidatorKind,
    pub persist: PersistMode,
    /// Restrict candidates to rows already marked under this name.
    pub upstream: Option<&'static str>,
}

/// The standard validator chain, in run order.
pub fn standard_validators() -> Vec<Validator> {
    vec![
        Validator {
            name: "invalid_property_name",
            kind: ValidatorKind::Name,
            persist: PersistMode::OnFail,
            upstream: None,
        },
        Validator {
            name: "valid_property_name",
            kind: ValidatorKind::Name,
            persist: PersistMode::OnPass,
            upstream: None,
        },
        Validator {
            name: "invalid_property_unit",
            kind: ValidatorKind::Unit,
            persist: PersistMode::OnFail,
            upstream: None,
        },
        Validator {
            name: "out_of_range_property_value",
            kind: ValidatorKind::Range,
            persist: PersistMode::OnFail,
            upstream: None,
        },
        Validator {
            name: "polymer_material",
            kind: ValidatorKind::Polymer,
            persist: PersistMode::OnPass,
            upstream: None,
        },
        Validator {
            name: "table_like_source",
            kind: ValidatorKind::Table,
            persist: PersistMode::OnPass,
            upstream: None,
        },
    ]
}

/// Unit validation restricted to rows that already passed the name
/// filter (marker chaining through `filtered_data`).
pub fn selected_unit_validator() -> Validator {
    Validator {
        name: "invalid_property_unit_selected",
        kind: ValidatorKind::Unit,
        persist: PersistMode::OnFail,
        upstream: Some("valid_property_name"),
    }
}

/// Look up a validator definition by marker name.
pub fn validator_by_name(name: &str) -> Option<Validator> {
    standard_validators()
        .into_iter()
        .chain(std::iter::once(selected_unit_validator()))
        .find(|v| v.name == name)
}

/// Generic checkpointed runner for one validator.
pub struct ValidatorRunner {
    ctx: PipelineContext,
    method: ExtractionMethod,
    validator: Validator,
    props: PropertyLookup,
    table_re: Regex,
}

impl ValidatorRunner {
    /// Load the method and the full property metadata set. A missing
    /// method is a fatal configuration error.
    pub async fn new(
        ctx: PipelineContext,
        method_name: &str,
        validator: Validator,
    ) -> Result<Self> {
        let method = ctx.require_method(method_name).await?;
        let props = PropertyLookup::new(ctx.properties.list_all().await?);
        Ok(Self {
            ctx,
            method,
            validator,
            props,
            table_re: Regex::new(r"\d\s+\d").expect("static regex"),
        })
    }

    /// Run one batch. `redo` ignores the checkpoint; `remove` deletes the
    /// validator's prior markers before reprocessing.
    pub async fn process_items(&self, limit: i64, redo: bool, remove: bool) -> Result<BatchSummary> {
        if remove {
            let removed = self
                .ctx
                .filtered
                .delete_by_filter(self.validator.name)
                .await?;
            info!(
                subsystem = "jobs",
                component = "validator",
                filter = self.validator.name,
                removed,
                "Removed prior markers before rerun"
            );
        }

        let driver = BatchDriver::new(
            self.ctx.checkpoints.clone(),
            self.validator.name,
            RECORDS_TABLE,
            json!({ "method": self.method.name }),
        );
        driver
            .run(self, &BatchOptions::default().with_limit(limit).with_redo(redo))
            .await
    }

    /// Evaluate the validator predicate for one record row.
    fn check(&self, row: &RecordRow) -> bool {
        match self.validator.kind {
            ValidatorKind::Name => self.props.get(&row.entity_name).is_some(),
            ValidatorKind::Unit => match self.props.get(&row.entity_name) {
                Some(meta) => {
                    meta.units.iter().any(|u| u == &row.unit)
                        || (row.unit.is_empty() && meta.units.is_empty())
                }
                None => false,
            },
            ValidatorKind::Range => match (self.props.get(&row.entity_name), row.numeric_value) {
                (Some(meta), Some(value)) => {
                    value >= meta.lower_limit && value <= meta.upper_limit
                }
                _ => false,
            },
            ValidatorKind::Polymer => row.material_class == MaterialClass::Polymer,
            ValidatorKind::Table => looks_like_table(&self.table_re, &row.paragraph_text),
        }
    }
}

/// Rendered-table heuristic: at least `TABLE_MIN_HITS`
/// digit-whitespace-digit matches inside one `TABLE_WINDOW_CHARS` window.
fn looks_like_table(re: &Regex, text: &str) -> bool {
    let starts: Vec<usize> = re.find_iter(text).map(|m| m.start()).collect();
    if starts.len() < defaults::TABLE_MIN_HITS {
        return false;
    }
    starts
        .windows(defaults::TABLE_MIN_HITS)
        .any(|w| w[defaults::TABLE_MIN_HITS - 1] - w[0] <= defaults::TABLE_WINDOW_CHARS)
}

#[async_trait]
impl RowProcessor for ValidatorRunner {
    type Row = RecordRow;

    fn row_id(row: &RecordRow) -> i64 {
        row.id
    }

    async fn fetch_after(&self, last: i64, limit: i64) -> Result<Vec<RecordRow>> {
        self.ctx
            .records
            .fetch_for_validation(self.method.id, last, limit, self.validator.upstream)
            .await
    }

    async fn process(&self, row: &RecordRow) -> Result<RowOutcome> {
        // Idempotence: a marker means this filter already evaluated the
        // row; never re-evaluate.
        if self
            .ctx
            .filtered
            .exists(RECORDS_TABLE, row.id, self.validator.name)
            .await?
        {
            return Ok(RowOutcome::Skipped);
        }

        let pass = self.check(row);
        let persist = match self.validator.persist {
            PersistMode::OnFail => !pass,
            PersistMode::OnPass => pass,
        };

        if !pass && self.validator.persist == PersistMode::OnFail {
            warn!(
                subsystem = "jobs",
                component = "validator",
                filter = self.validator.name,
                row = row.id,
                property = %row.entity_name,
                "Record failed validation"
            );
        }
        if pass && self.validator.kind == ValidatorKind::Table {
            warn!(
                subsystem = "jobs",
                component = "validator",
                filter = self.validator.name,
                row = row.id,
                paragraph_id = row.paragraph_id,
                "Source paragraph looks like a rendered table row"
            );
        }

        if persist {
            self.ctx
                .filtered
                .add(&FilteredRow {
                    table_name: RECORDS_TABLE.to_string(),
                    table_row: row.id,
                    filter_on: row.entity_name.clone(),
                    filter_name: self.validator.name.to_string(),
                })
                .await?;
            Ok(RowOutcome::Recorded(1))
        } else {
            Ok(RowOutcome::Skipped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_chain_shape() {
        let chain = standard_validators();
        assert_eq!(chain.len(), 6);
        let on_fail: Vec<&str> = chain
            .iter()
            .filter(|v| v.persist == PersistMode::OnFail)
            .map(|v| v.name)
            .collect();
        assert_eq!(
            on_fail,
            vec![
                "invalid_property_name",
                "invalid_property_unit",
                "out_of_range_property_value"
            ]
        );
    }

    #[test]
    fn test_selected_unit_validator_chains_upstream() {
        let v = selected_unit_validator();
        assert_eq!(v.upstream, Some("valid_property_name"));
        assert_eq!(v.kind, ValidatorKind::Unit);
    }

    #[test]
    fn test_validator_by_name() {
        assert!(validator_by_name("polymer_material").is_some());
        assert!(validator_by_name("invalid_property_unit_selected").is_some());
        assert!(validator_by_name("nope").is_none());
    }

    fn table_re() -> Regex {
        Regex::new(r"\d\s+\d").unwrap()
    }

    #[test]
    fn test_table_heuristic_fires_on_numeric_rows() {
        // Dense column dump, the typical rendered-table artifact.
        assert!(looks_like_table(&table_re(), "12 34 56 78 90 11 22"));
    }

    #[test]
    fn test_table_heuristic_ignores_prose() {
        assert!(!looks_like_table(
            &table_re(),
            "The glass transition temperature was 100 °C and the melting point was 240 °C."
        ));
        assert!(!looks_like_table(&table_re(), "no digits at all"));
    }

    #[test]
    fn test_table_heuristic_requires_hits_in_one_window() {
        // Three matches spread far apart do not fire.
        let spread = format!(
            "1 2{}3 4{}5 6",
            " filler text ".repeat(5),
            " filler text ".repeat(5)
        );
        assert!(!looks_like_table(&table_re(), &spread));
    }
}
