//! # polymat-core
//!
//! Core types, traits, and abstractions for the polymat extraction
//! pipeline.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other polymat crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod method;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use method::{ApiKind, ExtractionMethod, MethodParams};
pub use models::*;
pub use traits::*;
