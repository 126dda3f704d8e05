//! Core data models for polymat.
//!
//! These types are shared across all polymat crates and represent the
//! domain entities of the extraction pipeline: source paragraphs, NER tag
//! streams, material mentions, parsed property values, and the relational
//! bookkeeping rows (checkpoints, filter markers).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// =============================================================================
// SOURCE TEXT
// =============================================================================

/// An immutable unit of source text from a scientific paper.
///
/// Created once at ingestion, never mutated, referenced by id everywhere
/// downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: i64,
    pub paper_id: i64,
    pub doi: String,
    pub text: String,
    /// Directory/source-type tag (e.g. "elsevier", "acs").
    pub source: String,
}

// =============================================================================
// NER TYPES
// =============================================================================

/// A prediction span emitted by the NER tagger collaborator.
///
/// Offsets are character offsets into the tagged text; spans are
/// non-overlapping and sorted ascending by `start`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagSpan {
    pub start: usize,
    pub end: usize,
    pub entity_group: String,
    pub word: String,
}

/// One label per token of a tokenized paragraph. Ephemeral, produced per
/// inference call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NerTag {
    pub text: String,
    pub label: String,
}

/// Merged consecutive same-label [`NerTag`]s.
///
/// `start`/`end` are token-index offsets into the token sequence, not byte
/// offsets. Adjacent groups never share a label (maximal merge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NerLabelGroup {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// NER label vocabulary.
pub mod labels {
    /// Outside-any-entity label.
    pub const OUTSIDE: &str = "O";
    pub const POLYMER: &str = "POLYMER";
    pub const POLYMER_FAMILY: &str = "POLYMER_FAMILY";
    pub const MONOMER: &str = "MONOMER";
    pub const ORGANIC: &str = "ORGANIC";
    pub const INORGANIC: &str = "INORGANIC";
    pub const PROP_NAME: &str = "PROP_NAME";
    pub const PROP_VALUE: &str = "PROP_VALUE";
    pub const CONDITION: &str = "CONDITION";
    pub const MATERIAL_AMOUNT: &str = "MATERIAL_AMOUNT";

    /// Labels whose groups are treated as material mentions.
    pub fn is_material(label: &str) -> bool {
        matches!(
            label,
            POLYMER | POLYMER_FAMILY | MONOMER | ORGANIC | INORGANIC
        )
    }
}

// =============================================================================
// MATERIALS
// =============================================================================

/// Broad material classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MaterialClass {
    Polymer,
    Solvent,
    Composite,
    Blend,
    /// No classification available (stored as the empty string).
    #[default]
    Unknown,
}

impl MaterialClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialClass::Polymer => "POLYMER",
            MaterialClass::Solvent => "SOLVENT",
            MaterialClass::Composite => "COMPOSITE",
            MaterialClass::Blend => "BLEND",
            MaterialClass::Unknown => "",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "POLYMER" => MaterialClass::Polymer,
            "SOLVENT" => MaterialClass::Solvent,
            "COMPOSITE" => MaterialClass::Composite,
            "BLEND" => MaterialClass::Blend,
            _ => MaterialClass::Unknown,
        }
    }
}

/// Polymer topology classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PolymerType {
    #[default]
    Homopolymer,
    Copolymer,
    StarPolymer,
}

impl PolymerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolymerType::Homopolymer => "homopolymer",
            PolymerType::Copolymer => "copolymer",
            PolymerType::StarPolymer => "star_polymer",
        }
    }
}

/// A material mentioned in a paragraph, produced per extraction method.
///
/// Keyed uniquely by (paragraph id, method id, entity_name) in storage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MaterialMention {
    /// Surface form as it appears in the text.
    pub entity_name: String,
    pub material_class: MaterialClass,
    pub polymer_type: PolymerType,
    /// Canonical name after knowledge-base/coreference resolution.
    pub normalized_name: String,
    /// Alternate names/abbreviations referring to the same material.
    pub coreferents: Vec<String>,
    /// Component names for composites/blends/copolymers.
    pub components: Vec<String>,
    /// Optional role keyword (e.g. "matrix", "filler", "electrolyte").
    pub role: Option<String>,
}

// =============================================================================
// PROPERTY VALUES
// =============================================================================

/// A parsed property value derived deterministically from a raw string.
///
/// `numeric_value` is `None` (not zero) when no digit was found in the raw
/// string; downstream persistence rejects records without a numeric value.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PropertyValuePair {
    /// Property name as extracted (e.g. "glass transition temperature").
    pub entity_name: String,
    /// The raw value string the numeric fields were parsed from.
    pub raw_value: String,
    pub numeric_value: Option<f64>,
    pub numeric_error: Option<f64>,
    /// True when multiple numeric tokens were averaged.
    pub value_average: bool,
    /// Qualifier captured around the numbers ("to", "less than", ...).
    pub value_descriptor: String,
    /// Normalized unit string.
    pub unit: String,
    /// Measurement conditions (temperature, frequency, atmosphere).
    pub conditions: String,
}

/// A complete extracted record: one material paired with one parsed
/// property value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub material: MaterialMention,
    pub property: PropertyValuePair,
}

/// A persisted record row joined with the context validators need.
#[derive(Debug, Clone)]
pub struct RecordRow {
    pub id: i64,
    pub method_id: i64,
    pub material_id: i64,
    pub paragraph_id: i64,
    /// Property name stored on the record.
    pub entity_name: String,
    pub numeric_value: Option<f64>,
    pub unit: String,
    pub material_class: MaterialClass,
    /// Source paragraph text (for table detection).
    pub paragraph_text: String,
}

// =============================================================================
// CHECKPOINTS
// =============================================================================

/// A persisted high-water-mark row id enabling resumable incremental
/// processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: i64,
    pub name: String,
    pub table_name: String,
    pub row: i64,
    /// Free-form context/comment, used only as a read-side filter.
    pub context: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// Whether a checkpoint write at `candidate` is allowed given the maximum
/// existing watermark for the same (name, table) pair.
///
/// The comparison deliberately ignores the checkpoint context: two
/// contexts sharing a (name, table) pair block each other's regression.
pub fn advance_allowed(existing_max: Option<i64>, candidate: i64) -> bool {
    match existing_max {
        Some(max) => candidate >= max,
        None => true,
    }
}

// =============================================================================
// FILTER MARKERS
// =============================================================================

/// An append-only validator marker.
///
/// Presence under a given (filter_name, filter_on, table, row) tuple means
/// "this filter has already evaluated this row".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilteredRow {
    pub table_name: String,
    pub table_row: i64,
    /// Filter-group key, e.g. the property name.
    pub filter_on: String,
    /// Filter name, e.g. "invalid_property_unit".
    pub filter_name: String,
}

// =============================================================================
// PROPERTY METADATA
// =============================================================================

/// Per-property metadata driving name/unit/range validation.
///
/// A missing row for a configured property is a fatal configuration
/// error, not a data error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyMetadata {
    pub id: i64,
    pub name: String,
    /// Accepted names, compared case-insensitively.
    pub synonyms: Vec<String>,
    /// Accepted normalized units; an empty record unit is also accepted.
    pub units: Vec<String>,
    pub lower_limit: f64,
    pub upper_limit: f64,
    /// Whether unitless values in [0,1] are rescaled to percent.
    pub percent_scale: bool,
}

// =============================================================================
// CROSS-REFERENCES
// =============================================================================

/// A stored abbreviation/full-form pair scoped to a paragraph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrossrefPair {
    pub paragraph_id: i64,
    pub abbr: String,
    pub full_form: String,
}
