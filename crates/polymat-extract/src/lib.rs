//! # polymat-extract
//!
//! Extraction algorithms for polymat: word tokenization with character
//! offsets, NER tag alignment and grouping, the property-value parser and
//! unit-normalization table, record assembly from NER spans or LLM JSON,
//! and the abbreviation cross-reference resolver.
//!
//! Everything in this crate is a pure function of its inputs plus the
//! injected knowledge bases; persistence and model calls live in
//! `polymat-db` and `polymat-inference`.

pub mod align;
pub mod crossref;
pub mod fuzzy;
pub mod records;
pub mod units;
pub mod values;

pub use align::{align, group_consecutive_tags, word_tokenize, Token};
pub use crossref::CrossrefResolver;
pub use fuzzy::{matches_cutoff, token_set_ratio};
pub use records::{
    detect_polymer_type, detect_role, KnowledgeBase, PropertyLookup, RecordExtractor,
    ResolvedMaterial,
};
pub use units::{Conversion, UnitRule, UnitTable};
pub use values::{ParsedAmount, ValueParser};
