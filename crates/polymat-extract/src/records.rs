//! Record assembly: grouped NER spans or LLM JSON output in, structured
//! `(material, property value)` records out.
//!
//! Pure functions of their inputs plus the injected knowledge bases;
//! persistence is the pipelines' concern.

use std::collections::HashMap;

use serde_json::Value as JsonValue;
use tracing::{trace, warn};

use polymat_core::defaults::FUZZY_CUTOFF;
use polymat_core::models::labels;
use polymat_core::{
    ExtractedRecord, MaterialClass, MaterialMention, NerLabelGroup, PolymerType, PropertyMetadata,
};

use crate::crossref::CrossrefResolver;
use crate::fuzzy::token_set_ratio;
use crate::values::ValueParser;

/// Substrings marking copolymer nomenclature.
const COPOLYMER_INDICATORS: &[&str] = &[
    "-co-", "-b-", "-alt-", "-g-", "-ran-", "-stat-", "-block-", "-graft-", "copolymer",
];

/// Role keyword categories, scanned in order; first match wins.
const ROLE_CATEGORIES: &[&str] = &[
    "matrix",
    "filler",
    "plasticizer",
    "electrolyte",
    "membrane",
    "coating",
    "binder",
    "additive",
    "crosslinker",
    "surfactant",
    "compatibilizer",
];

/// Scholarly abbreviations whose trailing dot does not end a sentence.
const SENTENCE_ABBREVIATIONS: &[&str] = &[
    "et", "al", "fig", "figs", "ref", "refs", "eq", "eqs", "vs", "etc", "ca", "approx", "no",
    "cf", "sec", "min", "max", "inc",
];

/// Classify polymer topology from the entity name.
///
/// A name containing "star" is a star polymer; two or more "poly"
/// occurrences, a copolymer-indicator substring, or an all-caps
/// hyphenated token mark a copolymer; everything else is a homopolymer.
pub fn detect_polymer_type(name: &str) -> PolymerType {
    let lower = name.to_lowercase();
    if lower.contains("star") {
        return PolymerType::StarPolymer;
    }
    if lower.matches("poly").count() >= 2 {
        return PolymerType::Copolymer;
    }
    if COPOLYMER_INDICATORS.iter().any(|ind| lower.contains(ind)) {
        return PolymerType::Copolymer;
    }
    let alphabetic: Vec<char> = name.chars().filter(|c| c.is_alphabetic()).collect();
    if name.contains('-') && !alphabetic.is_empty() && alphabetic.iter().all(|c| c.is_uppercase())
    {
        return PolymerType::Copolymer;
    }
    PolymerType::Homopolymer
}

/// First role keyword appearing in the context, if any.
pub fn detect_role(context: &str) -> Option<String> {
    let lower = context.to_lowercase();
    ROLE_CATEGORIES
        .iter()
        .find(|kw| lower.contains(*kw))
        .map(|kw| (*kw).to_string())
}

/// Component names split out of a copolymer/composite entity name.
fn components_of(name: &str, polymer_type: PolymerType) -> Vec<String> {
    if polymer_type != PolymerType::Copolymer {
        return Vec::new();
    }
    let mut parts = vec![name.to_string()];
    for ind in COPOLYMER_INDICATORS {
        if *ind == "copolymer" {
            continue;
        }
        parts = parts
            .into_iter()
            .flat_map(|p| p.split(ind).map(String::from).collect::<Vec<_>>())
            .collect();
    }
    if parts.len() > 1 {
        parts.into_iter().map(|p| p.trim().to_string()).collect()
    } else {
        Vec::new()
    }
}

/// A knowledge-base hit for a material name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMaterial {
    pub normalized_name: String,
    pub material_class: MaterialClass,
    pub coreferents: Vec<String>,
}

/// Known-material lookup: canonical polymer and solvent names plus their
/// common abbreviations.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    /// lowercase surface form -> canonical name
    polymers: HashMap<String, String>,
    solvents: HashMap<String, String>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// A knowledge base seeded with common polymers and solvents. Real
    /// deployments extend this from the property database.
    pub fn builtin() -> Self {
        let mut kb = Self::new();
        for (surface, canonical) in [
            ("polyethylene", "polyethylene"),
            ("pe", "polyethylene"),
            ("polystyrene", "polystyrene"),
            ("ps", "polystyrene"),
            ("polypropylene", "polypropylene"),
            ("pp", "polypropylene"),
            ("poly(methyl methacrylate)", "poly(methyl methacrylate)"),
            ("pmma", "poly(methyl methacrylate)"),
            ("poly(vinyl chloride)", "poly(vinyl chloride)"),
            ("pvc", "poly(vinyl chloride)"),
            ("polycarbonate", "polycarbonate"),
            ("polyethylene terephthalate", "poly(ethylene terephthalate)"),
            ("pet", "poly(ethylene terephthalate)"),
            ("polytetrafluoroethylene", "polytetrafluoroethylene"),
            ("ptfe", "polytetrafluoroethylene"),
            ("poly(vinylidene fluoride)", "poly(vinylidene fluoride)"),
            ("pvdf", "poly(vinylidene fluoride)"),
            ("poly(lactic acid)", "poly(lactic acid)"),
            ("polylactic acid", "poly(lactic acid)"),
            ("pla", "poly(lactic acid)"),
            ("polyimide", "polyimide"),
            ("polyurethane", "polyurethane"),
            ("polyaniline", "polyaniline"),
            ("pani", "polyaniline"),
            ("polypyrrole", "polypyrrole"),
            ("poly(3-hexylthiophene)", "poly(3-hexylthiophene)"),
            ("p3ht", "poly(3-hexylthiophene)"),
            ("polydimethylsiloxane", "polydimethylsiloxane"),
            ("pdms", "polydimethylsiloxane"),
            ("polyacrylonitrile", "polyacrylonitrile"),
            ("pan", "polyacrylonitrile"),
            ("poly(ethylene oxide)", "poly(ethylene oxide)"),
            ("peo", "poly(ethylene oxide)"),
            ("poly(ethylene glycol)", "poly(ethylene glycol)"),
            ("peg", "poly(ethylene glycol)"),
        ] {
            kb.add_polymer(surface, canonical);
        }
        for (surface, canonical) in [
            ("water", "water"),
            ("chloroform", "chloroform"),
            ("toluene", "toluene"),
            ("acetone", "acetone"),
            ("ethanol", "ethanol"),
            ("methanol", "methanol"),
            ("dmf", "N,N-dimethylformamide"),
            ("n,n-dimethylformamide", "N,N-dimethylformamide"),
            ("dmso", "dimethyl sulfoxide"),
            ("dimethyl sulfoxide", "dimethyl sulfoxide"),
            ("thf", "tetrahydrofuran"),
            ("tetrahydrofuran", "tetrahydrofuran"),
            ("nmp", "N-methyl-2-pyrrolidone"),
            ("dichloromethane", "dichloromethane"),
            ("hexane", "hexane"),
        ] {
            kb.add_solvent(surface, canonical);
        }
        kb
    }

    pub fn add_polymer(&mut self, surface: &str, canonical: &str) {
        self.polymers
            .insert(surface.to_lowercase(), canonical.to_string());
    }

    pub fn add_solvent(&mut self, surface: &str, canonical: &str) {
        self.solvents
            .insert(surface.to_lowercase(), canonical.to_string());
    }

    /// Resolve a surface name: exact lookup, then fuzzy lookup at the
    /// cutoff score, then cross-reference expansion of the name with the
    /// same lookups.
    pub fn resolve(&self, name: &str, resolver: &CrossrefResolver) -> Option<ResolvedMaterial> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(hit) = self.lookup(trimmed) {
            return Some(hit);
        }

        for candidate in resolver.list_all(trimmed) {
            if let Some(mut hit) = self.lookup(&candidate) {
                hit.coreferents.push(trimmed.to_string());
                return Some(hit);
            }
        }
        None
    }

    fn lookup(&self, name: &str) -> Option<ResolvedMaterial> {
        let key = name.to_lowercase();
        if let Some(canonical) = self.polymers.get(&key) {
            return Some(ResolvedMaterial {
                normalized_name: canonical.clone(),
                material_class: MaterialClass::Polymer,
                coreferents: vec![name.to_string()],
            });
        }
        if let Some(canonical) = self.solvents.get(&key) {
            return Some(ResolvedMaterial {
                normalized_name: canonical.clone(),
                material_class: MaterialClass::Solvent,
                coreferents: vec![name.to_string()],
            });
        }

        let fuzzy_hit = |map: &HashMap<String, String>, class: MaterialClass| {
            map.iter()
                .map(|(k, v)| (token_set_ratio(&key, k), v))
                .filter(|(score, _)| *score >= FUZZY_CUTOFF as f64)
                .max_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, v)| ResolvedMaterial {
                    normalized_name: v.clone(),
                    material_class: class,
                    coreferents: vec![name.to_string()],
                })
        };
        fuzzy_hit(&self.polymers, MaterialClass::Polymer)
            .or_else(|| fuzzy_hit(&self.solvents, MaterialClass::Solvent))
    }
}

/// Lookup from lowercase property synonym to metadata.
#[derive(Debug, Default)]
pub struct PropertyLookup {
    by_synonym: HashMap<String, PropertyMetadata>,
}

impl PropertyLookup {
    pub fn new(metas: impl IntoIterator<Item = PropertyMetadata>) -> Self {
        let mut by_synonym = HashMap::new();
        for meta in metas {
            by_synonym.insert(meta.name.to_lowercase(), meta.clone());
            for syn in &meta.synonyms {
                by_synonym.insert(syn.to_lowercase(), meta.clone());
            }
        }
        Self { by_synonym }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyMetadata> {
        self.by_synonym.get(&name.to_lowercase())
    }
}

/// Assembles structured records from NER label groups or LLM JSON.
pub struct RecordExtractor {
    kb: KnowledgeBase,
    parser: ValueParser,
}

impl RecordExtractor {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self {
            kb,
            parser: ValueParser::new(),
        }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// NER path: pair material groups with (PROP_NAME, PROP_VALUE)
    /// adjacencies, sentence by sentence. Sentences without materials
    /// inherit the most recent preceding materials.
    pub fn extract_from_groups(
        &self,
        groups: &[NerLabelGroup],
        resolver: &CrossrefResolver,
        props: &PropertyLookup,
    ) -> Vec<ExtractedRecord> {
        let mut records = Vec::new();
        let mut carried: Vec<MaterialMention> = Vec::new();

        for sentence in split_sentences(groups) {
            let sentence_text: String = sentence
                .iter()
                .map(|g| g.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            let materials: Vec<MaterialMention> = sentence
                .iter()
                .filter(|g| labels::is_material(&g.label))
                .map(|g| self.build_mention(g, resolver, &sentence_text))
                .collect();

            let effective = if materials.is_empty() {
                carried.clone()
            } else {
                carried = materials.clone();
                materials
            };

            let conditions: String = sentence
                .iter()
                .filter(|g| g.label == labels::CONDITION)
                .map(|g| g.text.as_str())
                .collect::<Vec<_>>()
                .join("; ");

            if effective.is_empty() {
                continue;
            }

            for (name_group, value_group) in pair_name_value(&sentence) {
                let meta = props.get(&name_group.text);
                let pair = match self
                    .parser
                    .parse_property(&name_group.text, &value_group.text, meta)
                {
                    Ok(Some(mut pair)) => {
                        pair.conditions = conditions.clone();
                        pair
                    }
                    Ok(None) => {
                        trace!(
                            property = %name_group.text,
                            value = %value_group.text,
                            "no numeric value, record dropped"
                        );
                        continue;
                    }
                    Err(e) => {
                        warn!(
                            property = %name_group.text,
                            value = %value_group.text,
                            error = %e,
                            "value parse failed, record skipped"
                        );
                        continue;
                    }
                };

                for material in &effective {
                    records.push(ExtractedRecord {
                        material: material.clone(),
                        property: pair.clone(),
                    });
                }
            }
        }
        records
    }

    /// LLM path: defensively parse a JSON array of
    /// `{material, property, value, conditions}` objects. A record is
    /// rejected when the material cannot be resolved or the value has no
    /// number.
    pub fn extract_from_json(
        &self,
        value: &JsonValue,
        resolver: &CrossrefResolver,
        props: &PropertyLookup,
    ) -> Vec<ExtractedRecord> {
        let Some(items) = value.as_array() else {
            warn!("LLM response is not a JSON array, no records extracted");
            return Vec::new();
        };

        let mut records = Vec::new();
        for item in items {
            let Some(obj) = item.as_object() else {
                warn!("LLM record is not an object, skipped");
                continue;
            };

            let material = string_field(obj.get("material"));
            let property = string_field(obj.get("property"));
            // Some responses put the value under "numeric value".
            let raw_value = string_field(obj.get("value"))
                .or_else(|| string_field(obj.get("numeric value")));
            let conditions = match string_field(obj.get("conditions")) {
                Some(c) if c == "None" => String::new(),
                Some(c) => c,
                None => String::new(),
            };

            let (Some(material), Some(property), Some(raw_value)) =
                (material, property, raw_value)
            else {
                trace!("LLM record missing material/property/value, skipped");
                continue;
            };

            let Some(resolved) = self.kb.resolve(&material, resolver) else {
                trace!(material = %material, "material unresolved, record rejected");
                continue;
            };

            let meta = props.get(&property);
            let pair = match self.parser.parse_property(&property, &raw_value, meta) {
                Ok(Some(mut pair)) => {
                    pair.conditions = conditions;
                    pair
                }
                Ok(None) => {
                    trace!(value = %raw_value, "no numeric value, record rejected");
                    continue;
                }
                Err(e) => {
                    warn!(value = %raw_value, error = %e, "value parse failed, record skipped");
                    continue;
                }
            };

            let polymer_type = detect_polymer_type(&material);
            records.push(ExtractedRecord {
                material: MaterialMention {
                    entity_name: material.clone(),
                    material_class: resolved.material_class,
                    polymer_type,
                    normalized_name: resolved.normalized_name,
                    coreferents: resolved.coreferents,
                    components: components_of(&material, polymer_type),
                    role: None,
                },
                property: pair,
            });
        }
        records
    }

    fn build_mention(
        &self,
        group: &NerLabelGroup,
        resolver: &CrossrefResolver,
        sentence_text: &str,
    ) -> MaterialMention {
        let entity_name = group.text.clone();
        let (normalized_name, material_class, coreferents) =
            match self.kb.resolve(&entity_name, resolver) {
                Some(hit) => (hit.normalized_name, hit.material_class, hit.coreferents),
                None => (
                    entity_name.clone(),
                    class_from_label(&group.label),
                    Vec::new(),
                ),
            };
        let polymer_type = detect_polymer_type(&entity_name);
        MaterialMention {
            components: components_of(&entity_name, polymer_type),
            role: detect_role(sentence_text),
            entity_name,
            material_class,
            polymer_type,
            normalized_name,
            coreferents,
        }
    }
}

fn class_from_label(label: &str) -> MaterialClass {
    match label {
        labels::POLYMER | labels::POLYMER_FAMILY => MaterialClass::Polymer,
        _ => MaterialClass::Unknown,
    }
}

fn string_field(value: Option<&JsonValue>) -> Option<String> {
    match value {
        Some(JsonValue::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Pair each PROP_NAME group with the first unconsumed PROP_VALUE group
/// appearing after it in the sentence.
fn pair_name_value<'a>(
    sentence: &[&'a NerLabelGroup],
) -> Vec<(&'a NerLabelGroup, &'a NerLabelGroup)> {
    let mut pairs = Vec::new();
    let mut next_value = 0usize;
    for (idx, group) in sentence.iter().enumerate() {
        if group.label != labels::PROP_NAME {
            continue;
        }
        let from = next_value.max(idx + 1);
        if let Some(offset) = sentence[from..]
            .iter()
            .position(|g| g.label == labels::PROP_VALUE)
        {
            let value_idx = from + offset;
            pairs.push((*group, sentence[value_idx]));
            next_value = value_idx + 1;
        }
    }
    pairs
}

/// Split label groups into sentences on 'O' groups carrying a
/// sentence-terminal dot, tolerating abbreviation-induced false
/// boundaries.
fn split_sentences(groups: &[NerLabelGroup]) -> Vec<Vec<&NerLabelGroup>> {
    let mut sentences = Vec::new();
    let mut current: Vec<&NerLabelGroup> = Vec::new();
    for group in groups {
        current.push(group);
        if group.label == labels::OUTSIDE && ends_sentence(&group.text) {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

/// Whether group text ends a sentence: a trailing dot whose preceding
/// word is neither a scholarly abbreviation nor a bare initial.
fn ends_sentence(text: &str) -> bool {
    let trimmed = text.trim_end();
    if !trimmed.ends_with('.') {
        return false;
    }
    let Some(last_word) = trimmed.split_whitespace().last() else {
        return false;
    };
    let stem = last_word.trim_end_matches('.');
    if stem.is_empty() {
        // A lone "." token: treat as a boundary.
        return true;
    }
    if stem.chars().count() == 1 && stem.chars().next().unwrap().is_uppercase() {
        return false;
    }
    !SENTENCE_ABBREVIATIONS.contains(&stem.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polymat_core::NerTag;

    use crate::align::group_consecutive_tags;

    fn group(text: &str, label: &str) -> NerLabelGroup {
        NerLabelGroup {
            text: text.to_string(),
            label: label.to_string(),
            start: 0,
            end: 0,
        }
    }

    #[test]
    fn test_detect_polymer_type_star() {
        assert_eq!(
            detect_polymer_type("star-shaped polystyrene"),
            PolymerType::StarPolymer
        );
    }

    #[test]
    fn test_detect_polymer_type_double_poly() {
        assert_eq!(
            detect_polymer_type("polystyrene-polybutadiene"),
            PolymerType::Copolymer
        );
    }

    #[test]
    fn test_detect_polymer_type_indicator() {
        assert_eq!(
            detect_polymer_type("poly(styrene-co-acrylonitrile)"),
            PolymerType::Copolymer
        );
        assert_eq!(
            detect_polymer_type("PS-b-PMMA copolymer"),
            PolymerType::Copolymer
        );
    }

    #[test]
    fn test_detect_polymer_type_allcaps_hyphenated() {
        assert_eq!(detect_polymer_type("SBS-SEBS"), PolymerType::Copolymer);
    }

    #[test]
    fn test_detect_polymer_type_homopolymer_default() {
        assert_eq!(detect_polymer_type("polyethylene"), PolymerType::Homopolymer);
        assert_eq!(detect_polymer_type("PMMA"), PolymerType::Homopolymer);
    }

    #[test]
    fn test_detect_role_first_match_wins() {
        let role = detect_role("used as a filler in an epoxy matrix");
        // "matrix" precedes "filler" in the category scan order.
        assert_eq!(role, Some("matrix".to_string()));
        assert_eq!(detect_role("no keywords here"), None);
    }

    #[test]
    fn test_kb_exact_resolution() {
        let kb = KnowledgeBase::builtin();
        let resolver = CrossrefResolver::new();
        let hit = kb.resolve("PMMA", &resolver).unwrap();
        assert_eq!(hit.normalized_name, "poly(methyl methacrylate)");
        assert_eq!(hit.material_class, MaterialClass::Polymer);
    }

    #[test]
    fn test_kb_solvent_resolution() {
        let kb = KnowledgeBase::builtin();
        let resolver = CrossrefResolver::new();
        let hit = kb.resolve("DMF", &resolver).unwrap();
        assert_eq!(hit.material_class, MaterialClass::Solvent);
        assert_eq!(hit.normalized_name, "N,N-dimethylformamide");
    }

    #[test]
    fn test_kb_fuzzy_resolution() {
        let kb = KnowledgeBase::builtin();
        let resolver = CrossrefResolver::new();
        // Punctuation variant resolves through token-set scoring.
        let hit = kb.resolve("poly methyl methacrylate", &resolver).unwrap();
        assert_eq!(hit.normalized_name, "poly(methyl methacrylate)");
    }

    #[test]
    fn test_kb_crossref_resolution() {
        let kb = KnowledgeBase::builtin();
        let mut resolver = CrossrefResolver::new();
        resolver.process_paragraph("blends of polyethylene (LDPE-X) were prepared");
        // "LDPE-X" is unknown, but its full form resolves.
        let hit = kb.resolve("LDPE-X", &resolver);
        assert!(hit.is_some());
        let hit = hit.unwrap();
        assert_eq!(hit.normalized_name, "polyethylene");
        assert!(hit.coreferents.contains(&"LDPE-X".to_string()));
    }

    #[test]
    fn test_kb_unknown_is_none() {
        let kb = KnowledgeBase::builtin();
        let resolver = CrossrefResolver::new();
        assert!(kb.resolve("unobtainium", &resolver).is_none());
        assert!(kb.resolve("", &resolver).is_none());
    }

    fn tg_meta() -> PropertyMetadata {
        PropertyMetadata {
            id: 1,
            name: "glass transition temperature".into(),
            synonyms: vec!["Tg".into(), "glass transition".into()],
            units: vec!["° C".into()],
            lower_limit: -150.0,
            upper_limit: 500.0,
            percent_scale: false,
        }
    }

    #[test]
    fn test_property_lookup_by_synonym() {
        let lookup = PropertyLookup::new([tg_meta()]);
        assert!(lookup.get("tg").is_some());
        assert!(lookup.get("Tg").is_some());
        assert!(lookup.get("glass transition temperature").is_some());
        assert!(lookup.get("bandgap").is_none());
    }

    #[test]
    fn test_extract_from_groups_basic() {
        let extractor = RecordExtractor::new(KnowledgeBase::builtin());
        let resolver = CrossrefResolver::new();
        let props = PropertyLookup::new([tg_meta()]);

        let groups = vec![
            group("PS", labels::POLYMER),
            group("exhibits a", labels::OUTSIDE),
            group("Tg", labels::PROP_NAME),
            group("of", labels::OUTSIDE),
            group("100 °C", labels::PROP_VALUE),
        ];
        let records = extractor.extract_from_groups(&groups, &resolver, &props);
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.material.entity_name, "PS");
        assert_eq!(rec.material.normalized_name, "polystyrene");
        assert_eq!(rec.property.entity_name, "Tg");
        assert_eq!(rec.property.numeric_value, Some(100.0));
        assert_eq!(rec.property.unit, "° C");
    }

    #[test]
    fn test_extract_from_groups_conditions_attached() {
        let extractor = RecordExtractor::new(KnowledgeBase::builtin());
        let resolver = CrossrefResolver::new();
        let props = PropertyLookup::new([tg_meta()]);

        let groups = vec![
            group("PVDF", labels::POLYMER),
            group("Tg", labels::PROP_NAME),
            group("-35 °C", labels::PROP_VALUE),
            group("under nitrogen", labels::CONDITION),
        ];
        let records = extractor.extract_from_groups(&groups, &resolver, &props);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].property.conditions, "under nitrogen");
    }

    #[test]
    fn test_extract_from_groups_value_without_digit_dropped() {
        let extractor = RecordExtractor::new(KnowledgeBase::builtin());
        let resolver = CrossrefResolver::new();
        let props = PropertyLookup::new([tg_meta()]);

        let groups = vec![
            group("PS", labels::POLYMER),
            group("Tg", labels::PROP_NAME),
            group("not reported", labels::PROP_VALUE),
        ];
        let records = extractor.extract_from_groups(&groups, &resolver, &props);
        assert!(records.is_empty());
    }

    #[test]
    fn test_extract_from_groups_materials_carry_across_sentences() {
        let extractor = RecordExtractor::new(KnowledgeBase::builtin());
        let resolver = CrossrefResolver::new();
        let props = PropertyLookup::new([tg_meta()]);

        let groups = vec![
            group("PMMA", labels::POLYMER),
            group("films were cast.", labels::OUTSIDE),
            group("The", labels::OUTSIDE),
            group("Tg", labels::PROP_NAME),
            group("was", labels::OUTSIDE),
            group("105 °C", labels::PROP_VALUE),
        ];
        let records = extractor.extract_from_groups(&groups, &resolver, &props);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].material.entity_name, "PMMA");
    }

    #[test]
    fn test_extract_from_groups_abbreviation_does_not_split_sentence() {
        let groups = vec![
            group("PMMA", labels::POLYMER),
            group("was studied by Smith et al.", labels::OUTSIDE),
            group("Tg", labels::PROP_NAME),
            group("105 °C", labels::PROP_VALUE),
        ];
        let sentences = split_sentences(&groups);
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn test_extract_from_groups_pairs_follow_order() {
        let extractor = RecordExtractor::new(KnowledgeBase::builtin());
        let resolver = CrossrefResolver::new();
        let props = PropertyLookup::new([tg_meta()]);

        let groups = vec![
            group("PS", labels::POLYMER),
            group("Tg", labels::PROP_NAME),
            group("100 °C", labels::PROP_VALUE),
            group("and", labels::OUTSIDE),
            group("melting temperature", labels::PROP_NAME),
            group("240 °C", labels::PROP_VALUE),
        ];
        let records = extractor.extract_from_groups(&groups, &resolver, &props);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].property.entity_name, "Tg");
        assert_eq!(records[0].property.numeric_value, Some(100.0));
        assert_eq!(records[1].property.entity_name, "melting temperature");
        assert_eq!(records[1].property.numeric_value, Some(240.0));
    }

    #[test]
    fn test_extract_from_grouped_alignment_output() {
        // End-to-end over real grouping output.
        let tags = vec![
            NerTag { text: "PS".into(), label: "POLYMER".into() },
            NerTag { text: "has".into(), label: "O".into() },
            NerTag { text: "Tg".into(), label: "PROP_NAME".into() },
            NerTag { text: "100".into(), label: "PROP_VALUE".into() },
            NerTag { text: "°C".into(), label: "PROP_VALUE".into() },
        ];
        let groups = group_consecutive_tags(&tags);
        let extractor = RecordExtractor::new(KnowledgeBase::builtin());
        let records = extractor.extract_from_groups(
            &groups,
            &CrossrefResolver::new(),
            &PropertyLookup::new([tg_meta()]),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].property.numeric_value, Some(100.0));
    }

    #[test]
    fn test_llm_path_basic() {
        let extractor = RecordExtractor::new(KnowledgeBase::builtin());
        let resolver = CrossrefResolver::new();
        let props = PropertyLookup::new([tg_meta()]);
        let json = serde_json::json!([
            {"material": "polystyrene", "property": "Tg", "value": "100 °C", "conditions": "None"}
        ]);
        let records = extractor.extract_from_json(&json, &resolver, &props);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].material.normalized_name, "polystyrene");
        assert_eq!(records[0].property.numeric_value, Some(100.0));
        assert_eq!(records[0].property.conditions, "");
    }

    #[test]
    fn test_llm_path_numeric_value_key_tolerated() {
        let extractor = RecordExtractor::new(KnowledgeBase::builtin());
        let json = serde_json::json!([
            {"material": "PMMA", "property": "Tg", "numeric value": 105}
        ]);
        let records = extractor.extract_from_json(
            &json,
            &CrossrefResolver::new(),
            &PropertyLookup::new([tg_meta()]),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].property.numeric_value, Some(105.0));
    }

    #[test]
    fn test_llm_path_unresolved_material_rejected() {
        let extractor = RecordExtractor::new(KnowledgeBase::builtin());
        let json = serde_json::json!([
            {"material": "unobtainium", "property": "Tg", "value": "100 °C"}
        ]);
        let records = extractor.extract_from_json(
            &json,
            &CrossrefResolver::new(),
            &PropertyLookup::new([tg_meta()]),
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_llm_path_absent_numeric_rejected() {
        let extractor = RecordExtractor::new(KnowledgeBase::builtin());
        let json = serde_json::json!([
            {"material": "polystyrene", "property": "Tg", "value": "unknown"}
        ]);
        let records = extractor.extract_from_json(
            &json,
            &CrossrefResolver::new(),
            &PropertyLookup::new([tg_meta()]),
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_llm_path_non_array_yields_nothing() {
        let extractor = RecordExtractor::new(KnowledgeBase::builtin());
        let json = serde_json::json!({"material": "PS"});
        let records = extractor.extract_from_json(
            &json,
            &CrossrefResolver::new(),
            &PropertyLookup::new([tg_meta()]),
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_components_of_copolymer() {
        let components = components_of("PS-b-PMMA", PolymerType::Copolymer);
        assert_eq!(components, vec!["PS".to_string(), "PMMA".to_string()]);
        assert!(components_of("polyethylene", PolymerType::Homopolymer).is_empty());
    }
}
