//! Abbreviation/full-form cross-reference extraction and fuzzy lookup.
//!
//! Two passes per paragraph: a Schwartz-Hearst style definition finder
//! for `long form (SF)` patterns, then a manual parenthetical pass that
//! picks up capitalized short forms the finder missed. The manual pass
//! checks membership first so it never re-derives an abbreviation already
//! known for the paragraph.

use std::collections::{BTreeSet, HashMap};

use regex::Regex;
use tracing::trace;

use polymat_core::defaults::{CROSSREF_MAX_WORDS, FUZZY_CUTOFF};
use polymat_core::CrossrefPair;

use crate::fuzzy::token_set_ratio;

/// Paragraph-scoped abbreviation resolver.
#[derive(Debug, Default)]
pub struct CrossrefResolver {
    abbr_to_full: HashMap<String, String>,
    full_to_abbr: HashMap<String, String>,
}

impl CrossrefResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the resolver with pairs previously stored for this paragraph
    /// or paper.
    pub fn seed<'a>(&mut self, pairs: impl IntoIterator<Item = &'a CrossrefPair>) {
        for pair in pairs {
            self.insert(pair.abbr.clone(), pair.full_form.clone());
        }
    }

    /// Number of known abbreviations.
    pub fn len(&self) -> usize {
        self.abbr_to_full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abbr_to_full.is_empty()
    }

    pub fn contains_abbr(&self, abbr: &str) -> bool {
        self.abbr_to_full.contains_key(abbr)
    }

    /// Full form for an exact abbreviation, if known.
    pub fn full_form(&self, abbr: &str) -> Option<&str> {
        self.abbr_to_full.get(abbr).map(String::as_str)
    }

    fn insert(&mut self, abbr: String, full: String) {
        self.full_to_abbr.insert(full.clone(), abbr.clone());
        self.abbr_to_full.insert(abbr, full);
    }

    /// Extract abbreviation definitions from a paragraph, populating the
    /// abbr ↔ full-form maps. Returns the newly discovered pairs so the
    /// caller can persist them.
    pub fn process_paragraph(&mut self, text: &str) -> Vec<(String, String)> {
        let mut found = Vec::new();

        let paren_re = Regex::new(r"\(([^()]{1,12})\)").expect("static regex");

        // Definition finder: long form preceding "(SF)".
        for caps in paren_re.captures_iter(text) {
            let short = caps[1].trim();
            if !is_short_form_candidate(short) || self.contains_abbr(short) {
                continue;
            }
            let prefix = &text[..caps.get(0).unwrap().start()];
            if let Some(long) = best_long_form(short, prefix) {
                trace!(abbr = short, full = %long, "crossref definition found");
                self.insert(short.to_string(), long.clone());
                found.push((short.to_string(), long));
            }
        }

        // Manual pass: capitalized parentheticals the finder missed. Up
        // to five preceding words become the full-form candidate.
        let manual_re = Regex::new(r"\(([A-Z][A-Za-z0-9-]{0,9})\)").expect("static regex");
        for caps in manual_re.captures_iter(text) {
            let short = caps[1].trim();
            if short.chars().count() <= 1
                || short.chars().all(|c| c.is_ascii_digit())
                || self.contains_abbr(short)
            {
                continue;
            }
            let prefix = &text[..caps.get(0).unwrap().start()];
            let words: Vec<&str> = prefix
                .split_whitespace()
                .rev()
                .take(CROSSREF_MAX_WORDS)
                .collect();
            if words.is_empty() {
                continue;
            }
            let full: String = words
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join(" ")
                .trim_matches(trimmed_punct)
                .to_string();
            if full.is_empty() {
                continue;
            }
            trace!(abbr = short, full = %full, "crossref manual pair");
            self.insert(short.to_string(), full.clone());
            found.push((short.to_string(), full));
        }

        found
    }

    /// Fuzzy-match a query against abbreviation keys and full-form keys,
    /// returning matches from both directions, set-union deduplicated.
    pub fn list_all(&self, query: &str) -> Vec<String> {
        self.list_all_with_cutoff(query, FUZZY_CUTOFF)
    }

    pub fn list_all_with_cutoff(&self, query: &str, cutoff: u8) -> Vec<String> {
        let mut results = BTreeSet::new();
        for (abbr, full) in &self.abbr_to_full {
            if token_set_ratio(query, abbr) >= cutoff as f64 {
                results.insert(full.clone());
            }
        }
        for (full, abbr) in &self.full_to_abbr {
            if token_set_ratio(query, full) >= cutoff as f64 {
                results.insert(abbr.clone());
            }
        }
        results.into_iter().collect()
    }
}

/// Whether a parenthesized string looks like an abbreviation short form.
fn is_short_form_candidate(s: &str) -> bool {
    let len = s.chars().count();
    if !(2..=10).contains(&len) {
        return false;
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let first = s.chars().next().unwrap();
    first.is_alphanumeric() && s.chars().any(|c| c.is_alphabetic())
}

/// Schwartz-Hearst long-form search: match the short form's characters
/// right-to-left against the text preceding the parenthesis; the long
/// form starts at the word containing the short form's first letter.
fn best_long_form(short: &str, prefix: &str) -> Option<String> {
    let window: Vec<&str> = prefix
        .split_whitespace()
        .rev()
        .take((short.chars().count() + 5).min(short.chars().count() * 2).max(2))
        .collect();
    let candidate = window.into_iter().rev().collect::<Vec<_>>().join(" ");
    if candidate.is_empty() {
        return None;
    }

    let s_chars: Vec<char> = short
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect();
    let l_chars: Vec<char> = candidate.chars().flat_map(|c| c.to_lowercase()).collect();
    if s_chars.is_empty() {
        return None;
    }

    let mut l_idx = l_chars.len();
    for (pos, &sc) in s_chars.iter().enumerate().rev() {
        let first = pos == 0;
        loop {
            if l_idx == 0 {
                return None;
            }
            l_idx -= 1;
            let lc = l_chars[l_idx];
            // The first short-form character must start a word.
            let word_start = l_idx == 0 || l_chars[l_idx - 1].is_whitespace();
            if lc == sc && (!first || word_start) {
                break;
            }
        }
    }

    // Long form = candidate text from the word containing l_idx onward.
    let mut start = l_idx;
    while start > 0 && !l_chars[start - 1].is_whitespace() {
        start -= 1;
    }
    let long: String = candidate.chars().skip(start).collect::<String>();
    let long = long.trim_matches(trimmed_punct).to_string();
    if long.is_empty() || token_count(&long) > CROSSREF_MAX_WORDS {
        None
    } else {
        Some(long)
    }
}

fn token_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Characters stripped from full-form boundaries. Parentheses stay:
/// polymer names like "poly(methyl methacrylate)" depend on them.
fn trimmed_punct(c: char) -> bool {
    matches!(c, ',' | ';' | ':' | '.') || c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_finder_basic() {
        let mut resolver = CrossrefResolver::new();
        let found = resolver.process_paragraph("Films of polyethylene (PE) were cast.");
        assert!(found.iter().any(|(a, f)| a == "PE" && f == "polyethylene"));
        assert_eq!(resolver.full_form("PE"), Some("polyethylene"));
    }

    #[test]
    fn test_multiword_long_form() {
        let mut resolver = CrossrefResolver::new();
        resolver.process_paragraph("We used poly(methyl methacrylate) (PMMA) as matrix.");
        assert!(resolver.contains_abbr("PMMA"));
    }

    #[test]
    fn test_list_all_abbr_direction() {
        let mut resolver = CrossrefResolver::new();
        resolver.process_paragraph("Films of polyethylene (PE) were cast.");
        assert_eq!(resolver.list_all("PE"), vec!["polyethylene".to_string()]);
    }

    #[test]
    fn test_list_all_full_form_direction_case_insensitive() {
        let mut resolver = CrossrefResolver::new();
        resolver.process_paragraph("Films of polyethylene (PE) were cast.");
        let matches = resolver.list_all("Polyethylene");
        assert!(!matches.is_empty());
    }

    #[test]
    fn test_list_all_no_match_below_cutoff() {
        let mut resolver = CrossrefResolver::new();
        resolver.process_paragraph("Films of polyethylene (PE) were cast.");
        assert!(resolver.list_all("PS").is_empty());
        assert!(resolver.list_all("polystyrene").is_empty());
    }

    #[test]
    fn test_manual_pass_skips_numeric_and_single_char() {
        let mut resolver = CrossrefResolver::new();
        resolver.process_paragraph("as shown in Figure (3) and sample (A) here");
        assert!(!resolver.contains_abbr("3"));
        assert!(!resolver.contains_abbr("A"));
    }

    #[test]
    fn test_manual_pass_does_not_rederive_known_abbr() {
        let mut resolver = CrossrefResolver::new();
        resolver.seed(&[CrossrefPair {
            paragraph_id: 1,
            abbr: "DMF".to_string(),
            full_form: "N,N-dimethylformamide".to_string(),
        }]);
        let found = resolver.process_paragraph("dissolved in some solvent (DMF) overnight");
        assert!(found.is_empty());
        assert_eq!(resolver.full_form("DMF"), Some("N,N-dimethylformamide"));
    }

    #[test]
    fn test_manual_pass_picks_up_unmatched_parenthetical() {
        let mut resolver = CrossrefResolver::new();
        // "XLPE" does not letter-match the immediately preceding words, so
        // the definition finder fails and the manual pass takes over.
        let found = resolver.process_paragraph("the crosslinked material (XLPE) was tested");
        assert!(resolver.contains_abbr("XLPE"));
        assert_eq!(found.len(), 1);
        let full = resolver.full_form("XLPE").unwrap();
        assert!(full.split_whitespace().count() <= CROSSREF_MAX_WORDS);
    }

    #[test]
    fn test_seeded_pairs_answer_queries() {
        let mut resolver = CrossrefResolver::new();
        resolver.seed(&[CrossrefPair {
            paragraph_id: 7,
            abbr: "PVDF".to_string(),
            full_form: "poly(vinylidene fluoride)".to_string(),
        }]);
        assert_eq!(
            resolver.list_all("PVDF"),
            vec!["poly(vinylidene fluoride)".to_string()]
        );
    }

    #[test]
    fn test_empty_paragraph() {
        let mut resolver = CrossrefResolver::new();
        assert!(resolver.process_paragraph("").is_empty());
        assert!(resolver.is_empty());
    }
}
