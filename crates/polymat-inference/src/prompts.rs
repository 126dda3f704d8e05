//! Extraction prompt construction with pluggable few-shot selection.
//!
//! The prompt asks for a JSON array of
//! `{material, property, value, conditions}` objects; the record
//! extractor parses that array defensively. Shot selection is a strategy
//! seam: embeddings/clustering-based selectors plug in behind
//! [`ShotSelector`] without touching the builder.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use polymat_core::defaults;

/// A single worked extraction example embedded in the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shot {
    /// Example paragraph text.
    pub paragraph: String,
    /// Expected JSON array output, as a string.
    pub records_json: String,
}

/// Strategy for selecting few-shot examples for a paragraph.
pub trait ShotSelector: Send + Sync {
    /// Select up to `count` shots for the given paragraph.
    fn select(&self, paragraph: &str, count: usize) -> Vec<Shot>;
}

/// Selects the first N curated shots, in order.
pub struct FixedShotSelector {
    shots: Vec<Shot>,
}

impl FixedShotSelector {
    pub fn new(shots: Vec<Shot>) -> Self {
        Self { shots }
    }
}

impl ShotSelector for FixedShotSelector {
    fn select(&self, _paragraph: &str, count: usize) -> Vec<Shot> {
        self.shots.iter().take(count).cloned().collect()
    }
}

/// Samples N shots uniformly from the pool.
pub struct RandomShotSelector {
    shots: Vec<Shot>,
}

impl RandomShotSelector {
    pub fn new(shots: Vec<Shot>) -> Self {
        Self { shots }
    }
}

impl ShotSelector for RandomShotSelector {
    fn select(&self, _paragraph: &str, count: usize) -> Vec<Shot> {
        let mut rng = rand::thread_rng();
        self.shots
            .choose_multiple(&mut rng, count.min(self.shots.len()))
            .cloned()
            .collect()
    }
}

/// Curated default shots covering the common record shapes.
pub fn default_shots() -> Vec<Shot> {
    vec![
        Shot {
            paragraph: "The glass transition temperature of polystyrene (PS) was measured \
                        as 102 °C by DSC."
                .to_string(),
            records_json: r#"[{"material": "polystyrene", "property": "glass transition temperature", "value": "102 °C", "conditions": "measured by DSC"}]"#
                .to_string(),
        },
        Shot {
            paragraph: "PVDF films showed a tensile strength of 48 ± 3 MPa at room \
                        temperature."
                .to_string(),
            records_json: r#"[{"material": "PVDF", "property": "tensile strength", "value": "48 ± 3 MPa", "conditions": "room temperature"}]"#
                .to_string(),
        },
        Shot {
            paragraph: "No property values are reported in this paragraph.".to_string(),
            records_json: "[]".to_string(),
        },
    ]
}

/// Builds extraction prompts for one property family.
pub struct PromptBuilder {
    properties: Vec<String>,
    selector: Box<dyn ShotSelector>,
    shot_count: usize,
}

impl PromptBuilder {
    pub fn new(properties: Vec<String>, selector: Box<dyn ShotSelector>) -> Self {
        Self {
            properties,
            selector,
            shot_count: defaults::PROMPT_SHOT_COUNT,
        }
    }

    /// Builder with the curated default shots.
    pub fn with_default_shots(properties: Vec<String>) -> Self {
        Self::new(properties, Box::new(FixedShotSelector::new(default_shots())))
    }

    pub fn with_shot_count(mut self, count: usize) -> Self {
        self.shot_count = count;
        self
    }

    /// Build the full extraction prompt for a paragraph.
    pub fn build(&self, paragraph: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str(
            "You extract materials property data from scientific text. \
             Report every measured value",
        );
        if !self.properties.is_empty() {
            prompt.push_str(&format!(" of: {}", self.properties.join(", ")));
        }
        prompt.push_str(
            ". Respond with a JSON array of objects with keys \
             \"material\", \"property\", \"value\", and \"conditions\". \
             Use \"None\" for conditions when the text gives none. \
             Respond with [] when the paragraph reports no values.\n\n",
        );

        for shot in self.selector.select(paragraph, self.shot_count) {
            prompt.push_str(&format!(
                "Paragraph: {}\nRecords: {}\n\n",
                shot.paragraph, shot.records_json
            ));
        }

        prompt.push_str(&format!("Paragraph: {}\nRecords:", paragraph));
        prompt
    }
}
